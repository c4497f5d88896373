use serde::{Deserialize, Serialize};

/// Account record as the backend sees it. Timestamps stay as the wire
/// strings; only crate-generated stamps use chrono types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: Option<String>,
    pub phone: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Per-app member profile, including the loyalty point balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub app_id: i64,
    pub name: String,
    pub birthday: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub points_total: i64,
    pub active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub app: Option<App>,
}

/// Partial profile update for `PUT /me`; unset fields are omitted from the
/// request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// The mini app registration this client runs under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
    pub mini_app_id: Option<String>,
    pub active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile() {
        let json = r#"{
            "id": 12,
            "user_id": 7,
            "app_id": 1,
            "name": "Linh",
            "birthday": "1998-04-02",
            "gender": "female",
            "address": null,
            "points_total": 1250,
            "active": true,
            "created_at": "2024-11-02T08:15:00.000000Z",
            "updated_at": "2025-06-30T10:00:00.000000Z",
            "user": {
                "id": 7,
                "email": null,
                "phone": "+84900000000",
                "created_at": "2024-11-02T08:15:00.000000Z",
                "updated_at": "2024-11-02T08:15:00.000000Z"
            }
        }"#;

        let profile: Profile = serde_json::from_str(json).expect("Failed to parse profile");
        assert_eq!(profile.name, "Linh");
        assert_eq!(profile.points_total, 1250);
        assert_eq!(
            profile.user.as_ref().map(|u| u.phone.as_str()),
            Some("+84900000000")
        );
        assert!(profile.app.is_none());
    }

    #[test]
    fn test_update_request_omits_unset_fields() {
        let update = UpdateProfileRequest {
            name: Some("Linh Tran".to_string()),
            ..Default::default()
        };
        let body = serde_json::to_string(&update).expect("Failed to serialize update");
        assert_eq!(body, r#"{"name":"Linh Tran"}"#);
    }
}
