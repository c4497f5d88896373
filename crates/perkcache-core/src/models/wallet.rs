use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{App, Voucher};

/// Lifecycle of a voucher held in the member's wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    Redeemed,
    Used,
    Expired,
}

impl WalletStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletStatus::Redeemed => "redeemed",
            WalletStatus::Used => "used",
            WalletStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A voucher the member has redeemed, with its single-use code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletItem {
    pub id: i64,
    pub user_id: i64,
    pub app_id: i64,
    pub voucher_id: i64,
    pub code: String,
    pub status: WalletStatus,
    pub redeemed_at: Option<String>,
    pub used_at: Option<String>,
    pub expire_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub voucher: Voucher,
    #[serde(default)]
    pub app: Option<App>,
}

/// Response of `POST /vouchers/{id}/redeem`. The backend returns `app_id` as
/// a string on this endpoint only; kept as-is rather than papering over it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemedVoucher {
    pub id: i64,
    pub user_id: i64,
    pub app_id: String,
    pub voucher_id: i64,
    pub code: String,
    pub status: WalletStatus,
    pub redeemed_at: Option<String>,
    pub expire_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub voucher: Voucher,
    #[serde(default)]
    pub app: Option<App>,
}

/// Filters for `GET /wallet`.
#[derive(Debug, Clone, Default)]
pub struct WalletQuery {
    pub status: Option<WalletStatus>,
    pub keyword: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl WalletQuery {
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
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

/// Kind of ledger entry in the transaction history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Redeem,
    Use,
    PointsEarned,
    PointsSpent,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Redeem => "redeem",
            HistoryKind::Use => "use",
            HistoryKind::PointsEarned => "points_earned",
            HistoryKind::PointsSpent => "points_spent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Success,
    Failed,
}

/// Open metadata blob attached to history entries. `code` and `points_used`
/// are the known keys; anything else the backend adds is preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_used: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One transaction-history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: i64,
    pub user_id: i64,
    pub app_id: i64,
    pub voucher_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub status: HistoryStatus,
    #[serde(default)]
    pub metadata: HistoryMetadata,
    pub created_by: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub voucher: Option<Voucher>,
    #[serde(default)]
    pub app: Option<App>,
}

/// Filters for `GET /history`.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub kind: Option<HistoryKind>,
    pub keyword: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl HistoryQuery {
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(kind) = self.kind {
            params.push(("type", kind.as_str().to_string()));
        }
        if let Some(ref keyword) = self.keyword {
            params.push(("keyword", keyword.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wallet_item() {
        let json = r#"{
            "id": 88,
            "user_id": 7,
            "app_id": 1,
            "voucher_id": 31,
            "code": "PK-7F3A2B",
            "status": "redeemed",
            "redeemed_at": "2025-07-20T09:12:00.000000Z",
            "used_at": null,
            "expire_at": "2026-12-31T16:59:59.000000Z",
            "created_at": "2025-07-20T09:12:00.000000Z",
            "updated_at": "2025-07-20T09:12:00.000000Z",
            "voucher": {
                "id": 31,
                "app_id": 1,
                "category_id": 4,
                "name": "Giảm 50k cho đơn từ 200k",
                "description": null,
                "image": null,
                "detail": null,
                "required_points": 500,
                "expire_at": "2026-12-31T16:59:59.000000Z",
                "usage_condition": null,
                "quantity": 119,
                "active": true,
                "created_at": null,
                "updated_at": null
            }
        }"#;

        let item: WalletItem = serde_json::from_str(json).expect("Failed to parse wallet item");
        assert_eq!(item.status, WalletStatus::Redeemed);
        assert_eq!(item.code, "PK-7F3A2B");
        assert!(item.used_at.is_none());
        assert_eq!(item.voucher.required_points, 500);
    }

    #[test]
    fn test_parse_history_item_with_extra_metadata() {
        let json = r#"{
            "id": 301,
            "user_id": 7,
            "app_id": 1,
            "voucher_id": 31,
            "type": "points_spent",
            "status": "success",
            "metadata": {
                "code": "PK-7F3A2B",
                "points_used": 500,
                "store_id": 14
            },
            "created_by": null,
            "created_at": "2025-07-20T09:12:00.000000Z",
            "updated_at": "2025-07-20T09:12:00.000000Z"
        }"#;

        let item: HistoryItem = serde_json::from_str(json).expect("Failed to parse history item");
        assert_eq!(item.kind, HistoryKind::PointsSpent);
        assert_eq!(item.status, HistoryStatus::Success);
        assert_eq!(item.metadata.points_used, Some(500));
        assert_eq!(
            item.metadata.extra.get("store_id"),
            Some(&Value::from(14))
        );
    }

    #[test]
    fn test_wallet_status_roundtrip() {
        let status: WalletStatus = serde_json::from_str(r#""expired""#).expect("parse status");
        assert_eq!(status, WalletStatus::Expired);
        assert_eq!(status.to_string(), "expired");
    }

    #[test]
    fn test_history_query_params() {
        let query = HistoryQuery {
            kind: Some(HistoryKind::Redeem),
            limit: Some(10),
            ..Default::default()
        };
        assert_eq!(
            query.to_query(),
            vec![
                ("type", "redeem".to_string()),
                ("limit", "10".to_string()),
            ]
        );
    }
}
