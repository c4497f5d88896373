use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Envelope every backend endpoint wraps its payload in.
///
/// `error` is either a plain message or a map of field name to message
/// (validation failures).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(BTreeMap<String, String>),
}

impl ErrorDetail {
    /// Flatten to a single line suitable for logs and error types.
    pub fn message(&self) -> String {
        match self {
            ErrorDetail::Message(msg) => msg.clone(),
            ErrorDetail::Fields(fields) => fields
                .iter()
                .map(|(field, msg)| format!("{}: {}", field, msg))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Laravel-style pagination wrapper returned by the list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub current_page: i64,
    pub data: Vec<T>,
    pub first_page_url: Option<String>,
    pub from: Option<i64>,
    pub last_page: i64,
    pub last_page_url: Option<String>,
    #[serde(default)]
    pub links: Vec<PageLink>,
    pub next_page_url: Option<String>,
    pub path: Option<String>,
    pub per_page: i64,
    pub prev_page_url: Option<String>,
    pub to: Option<i64>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLink {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

impl<T> Paginated<T> {
    pub fn has_more(&self) -> bool {
        self.next_page_url.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_message_flattens_fields() {
        let json = r#"{"phone": "The phone field is required.", "name": "The name field is required."}"#;
        let detail: ErrorDetail = serde_json::from_str(json).expect("Failed to parse field errors");
        let msg = detail.message();
        assert!(msg.contains("phone: The phone field is required."));
        assert!(msg.contains("name: The name field is required."));
    }

    #[test]
    fn test_error_detail_plain_message() {
        let detail: ErrorDetail =
            serde_json::from_str(r#""Invalid secret key""#).expect("Failed to parse message");
        assert_eq!(detail.message(), "Invalid secret key");
    }

    #[test]
    fn test_envelope_without_data_or_error() {
        let resp: ApiResponse<i64> =
            serde_json::from_str(r#"{"success": true}"#).expect("Failed to parse envelope");
        assert!(resp.success);
        assert!(resp.data.is_none());
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_paginated_has_more() {
        let json = r#"{
            "current_page": 1,
            "data": [1, 2, 3],
            "first_page_url": "https://example.test/api/v1/vouchers?page=1",
            "from": 1,
            "last_page": 4,
            "last_page_url": "https://example.test/api/v1/vouchers?page=4",
            "links": [{"url": null, "label": "&laquo; Previous", "active": false}],
            "next_page_url": "https://example.test/api/v1/vouchers?page=2",
            "path": "https://example.test/api/v1/vouchers",
            "per_page": 3,
            "prev_page_url": null,
            "to": 3,
            "total": 10
        }"#;
        let page: Paginated<i64> = serde_json::from_str(json).expect("Failed to parse page");
        assert!(page.has_more());
        assert!(!page.is_empty());
        assert_eq!(page.data, vec![1, 2, 3]);

        let last = Paginated::<i64> {
            next_page_url: None,
            ..page
        };
        assert!(!last.has_more());
    }
}
