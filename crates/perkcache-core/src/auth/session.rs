use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;

/// Storage key for the bearer token
const TOKEN_KEY: &str = "auth_token";

/// Storage key for the issue timestamp (epoch milliseconds)
const ISSUED_AT_KEY: &str = "auth_time";

/// Token expiry time in hours.
/// The backend issues tokens valid for 24 hours.
const TOKEN_TTL_HOURS: i64 = 24;

/// A bearer token together with the moment it was issued. Mirrored to the
/// persistent store so a restarted process skips re-acquisition until the
/// TTL elapses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

impl SessionData {
    /// Stamp a freshly issued token.
    pub fn issued_now(token: String) -> Self {
        Self {
            token,
            issued_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        let expiry = self.issued_at + Duration::hours(TOKEN_TTL_HOURS);
        Utc::now() > expiry
    }

    pub fn time_until_expiry(&self) -> Duration {
        let expiry = self.issued_at + Duration::hours(TOKEN_TTL_HOURS);
        expiry - Utc::now()
    }

    /// Load a persisted session, if both keys are present and parseable.
    /// Expiry is not checked here; the caller decides what stale means.
    pub async fn load(store: &dyn KeyValueStore) -> Result<Option<SessionData>> {
        let token = store.get(TOKEN_KEY).await?;
        let issued = store.get(ISSUED_AT_KEY).await?;
        match (token, issued) {
            (Some(token), Some(millis)) => {
                let millis: i64 = millis
                    .trim()
                    .parse()
                    .context("Failed to parse stored auth timestamp")?;
                let issued_at = Utc
                    .timestamp_millis_opt(millis)
                    .single()
                    .context("Stored auth timestamp out of range")?;
                Ok(Some(SessionData { token, issued_at }))
            }
            _ => Ok(None),
        }
    }

    /// Persist under the fixed keys. The timestamp is stored as epoch
    /// milliseconds, matching what host storage held historically.
    pub async fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        store.set(TOKEN_KEY, &self.token).await?;
        store
            .set(ISSUED_AT_KEY, &self.issued_at.timestamp_millis().to_string())
            .await?;
        Ok(())
    }

    /// Remove the persisted session. Safe to call when nothing is stored.
    pub async fn clear(store: &dyn KeyValueStore) -> Result<()> {
        store.remove(TOKEN_KEY).await?;
        store.remove(ISSUED_AT_KEY).await?;
        Ok(())
    }
}
