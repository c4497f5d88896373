use serde::{Deserialize, Serialize};

use super::App;

/// Catalog category used to group vouchers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub app_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// A redeemable catalog voucher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    pub id: i64,
    pub app_id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub detail: Option<String>,
    pub required_points: i64,
    pub expire_at: Option<String>,
    pub usage_condition: Option<String>,
    pub quantity: i64,
    pub active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub app: Option<App>,
}

impl Voucher {
    /// Whether a member holding `points` can redeem this voucher right now.
    /// Expiry is enforced server-side; the client only gates on stock,
    /// activation and balance.
    pub fn is_redeemable_with(&self, points: i64) -> bool {
        self.active && self.quantity > 0 && points >= self.required_points
    }
}

/// Filters for `GET /vouchers`.
#[derive(Debug, Clone, Default)]
pub struct VouchersQuery {
    pub category_id: Option<i64>,
    pub keyword: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl VouchersQuery {
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(category_id) = self.category_id {
            params.push(("category_id", category_id.to_string()));
        }
        if let Some(ref keyword) = self.keyword {
            params.push(("keyword", keyword.clone()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            params.push(("per_page", per_page.to_string()));
        }
        params
    }
}
