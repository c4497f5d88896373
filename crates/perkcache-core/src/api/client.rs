//! API client for the loyalty backend.
//!
//! This module provides the `ApiClient` struct for talking to the REST API:
//! the identity-for-token exchange, the voucher catalog, the member wallet
//! and the point ledger. Every request carries the `X-App-Id` header; calls
//! made after login add the bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{AuthBackend, AuthError};
use crate::config::Config;
use crate::models::{
    ApiResponse, Category, HistoryItem, HistoryQuery, LoginRequest, LoginResponse, Paginated,
    Profile, RedeemedVoucher, UpdateProfileRequest, Voucher, VouchersQuery, WalletItem,
    WalletQuery,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Header identifying the mini app registration on every request.
const APP_ID_HEADER: &str = "X-App-Id";

/// HTTP request timeout in seconds.
/// 30s allows for slow responses over mobile networks while failing fast
/// enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
/// 3 retries with exponential backoff usually succeeds without excessive delay.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
/// 1 second is polite to the server while not making users wait too long.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the loyalty backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    app_id: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client from configuration.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Drop the bearer token (logout).
    pub fn drop_token(&mut self) {
        self.token = None;
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    /// This is more efficient than creating a new client for each request.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            app_id: self.app_id.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            APP_ID_HEADER,
            header::HeaderValue::from_str(&self.app_id).map_err(|e| {
                ApiError::InvalidResponse(format!("app id is not a valid header value: {}", e))
            })?,
        );
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                    ApiError::InvalidResponse(format!("token is not a valid header value: {}", e))
                })?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit
    /// (should retry), or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            // Rate limited - signal to retry
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Unwrap the `{success, data, error}` envelope around every payload.
    fn unwrap_envelope<T>(envelope: ApiResponse<T>, what: &str) -> Result<T, ApiError> {
        if !envelope.success {
            let message = envelope
                .error
                .map(|e| e.message())
                .unwrap_or_else(|| format!("{} failed", what));
            return Err(ApiError::Rejected(message));
        }
        envelope
            .data
            .ok_or_else(|| ApiError::InvalidResponse(format!("{}: envelope missing data", what)))
    }

    /// Send a request, unwrap the envelope, retrying on 429 with exponential
    /// backoff. The builder closure is re-invoked for each attempt.
    async fn execute_json<T, F>(&self, what: &str, build: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> reqwest::RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build(&self.client)
                .headers(self.request_headers()?)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let envelope: ApiResponse<T> = response.json().await?;
                    return Self::unwrap_envelope(envelope, what);
                }
                None => {
                    // Rate limited
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(
                        endpoint = what,
                        retry = retries,
                        backoff_ms = backoff_ms,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    // ===== Auth =====

    /// Exchange host identity plus the shared secret for a bearer token.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        debug!(phone = %request.phone, "Sending login request");
        self.execute_json("login", |client| {
            client.post(self.url("/auth/login")).json(request)
        })
        .await
    }

    // ===== Profile =====

    /// Fetch the authenticated member's profile
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.execute_json("profile", |client| client.get(self.url("/me")))
            .await
    }

    /// Update the authenticated member's profile
    pub async fn update_profile(
        &self,
        update: &UpdateProfileRequest,
    ) -> Result<Profile, ApiError> {
        self.execute_json("update profile", |client| {
            client.put(self.url("/me")).json(update)
        })
        .await
    }

    // ===== Catalog =====

    /// Fetch all voucher categories
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.execute_json("categories", |client| client.get(self.url("/categories")))
            .await
    }

    /// Fetch a page of the voucher catalog with optional filters
    pub async fn vouchers(&self, query: &VouchersQuery) -> Result<Paginated<Voucher>, ApiError> {
        self.execute_json("vouchers", |client| {
            client.get(self.url("/vouchers")).query(&query.to_query())
        })
        .await
    }

    /// Fetch the newest vouchers (the "hot deal" strip)
    pub async fn latest_vouchers(&self, limit: Option<u32>) -> Result<Vec<Voucher>, ApiError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        self.execute_json("latest vouchers", |client| {
            client.get(self.url("/vouchers/latest")).query(&params)
        })
        .await
    }

    /// Fetch a single voucher by id
    pub async fn voucher(&self, id: i64) -> Result<Voucher, ApiError> {
        self.execute_json("voucher", |client| {
            client.get(self.url(&format!("/vouchers/{}", id)))
        })
        .await
    }

    // ===== Wallet =====

    /// Redeem a catalog voucher into the member's wallet
    pub async fn redeem_voucher(&self, id: i64) -> Result<RedeemedVoucher, ApiError> {
        self.execute_json("redeem voucher", |client| {
            client.post(self.url(&format!("/vouchers/{}/redeem", id)))
        })
        .await
    }

    /// Mark a wallet voucher as used by its code
    pub async fn use_voucher(&self, code: &str) -> Result<WalletItem, ApiError> {
        self.execute_json("use voucher", |client| {
            client.post(self.url(&format!("/wallet/{}/use", code)))
        })
        .await
    }

    /// Fetch a page of the member's wallet
    pub async fn wallet(&self, query: &WalletQuery) -> Result<Paginated<WalletItem>, ApiError> {
        self.execute_json("wallet", |client| {
            client.get(self.url("/wallet")).query(&query.to_query())
        })
        .await
    }

    /// Fetch a page of the member's transaction history
    pub async fn history(&self, query: &HistoryQuery) -> Result<Paginated<HistoryItem>, ApiError> {
        self.execute_json("history", |client| {
            client.get(self.url("/history")).query(&query.to_query())
        })
        .await
    }

    // ===== Policies =====

    /// Fetch the membership policy document (HTML)
    pub async fn membership_policy(&self) -> Result<String, ApiError> {
        self.execute_json("membership policy", |client| {
            client.get(self.url("/policies/membership"))
        })
        .await
    }

    /// Fetch the privacy policy document (HTML)
    pub async fn privacy_policy(&self) -> Result<String, ApiError> {
        self.execute_json("privacy policy", |client| {
            client.get(self.url("/policies/privacy"))
        })
        .await
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn exchange(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        self.login(request).await.map_err(|err| AuthError::Exchange {
            status: err.status(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_envelope_success() {
        let envelope = ApiResponse {
            success: true,
            data: Some(42),
            error: None,
        };
        assert_eq!(ApiClient::unwrap_envelope(envelope, "answer").unwrap(), 42);
    }

    #[test]
    fn test_unwrap_envelope_rejected_uses_api_message() {
        let envelope: ApiResponse<i64> = serde_json::from_str(
            r#"{"success": false, "error": "Voucher out of stock"}"#,
        )
        .expect("Failed to parse envelope");
        match ApiClient::unwrap_envelope(envelope, "redeem voucher") {
            Err(ApiError::Rejected(msg)) => assert_eq!(msg, "Voucher out of stock"),
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_unwrap_envelope_success_without_data() {
        let envelope: ApiResponse<i64> =
            serde_json::from_str(r#"{"success": true}"#).expect("Failed to parse envelope");
        match ApiClient::unwrap_envelope(envelope, "wallet") {
            Err(ApiError::InvalidResponse(msg)) => assert!(msg.contains("wallet")),
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_login_envelope() {
        let json = r#"{
            "success": true,
            "data": {
                "user": {"id": 7, "email": null, "phone": "+84900000000",
                         "created_at": null, "updated_at": null},
                "profile": {"id": 12, "user_id": 7, "app_id": 1, "name": "Linh",
                            "birthday": null, "gender": null, "address": null,
                            "points_total": 0, "active": true,
                            "created_at": null, "updated_at": null},
                "token": "tok_abc"
            }
        }"#;
        let envelope: ApiResponse<LoginResponse> =
            serde_json::from_str(json).expect("Failed to parse login envelope");
        let login = ApiClient::unwrap_envelope(envelope, "login").unwrap();
        assert_eq!(login.token, "tok_abc");
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let config = Config {
            api_base_url: "https://example.test/api/v1/".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config).expect("Failed to build client");
        assert_eq!(client.url("/vouchers"), "https://example.test/api/v1/vouchers");
    }
}
