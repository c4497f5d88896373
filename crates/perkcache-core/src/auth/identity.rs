//! Host identity: the trait the mini app shell implements and the cache the
//! session manager reads.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::KeyValueStore;

use super::AuthError;

/// Storage key for the cached identity blob
const IDENTITY_KEY: &str = "user_data";

/// User info as the host shell reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostUserInfo {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// Identity fields cached alongside the session. A token is only served
/// directly when this is complete; a present-but-incomplete identity forces
/// re-acquisition even if the token has not expired.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachedIdentity {
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub phone_number: Option<String>,
}

impl CachedIdentity {
    pub fn is_complete(&self) -> bool {
        self.display_name.as_deref().is_some_and(|s| !s.is_empty())
            && self.phone_number.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// The host shell's identity surface. Each call may suspend on a native
/// prompt. Implementations own the terminate-on-denial side effect: when the
/// user declines the permission prompt they ask the host to close the app
/// and return `PermissionDenied`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Ensure the identity scopes are granted, prompting the user if needed.
    async fn request_permissions(&self) -> Result<(), AuthError>;

    /// Fetch id, display name and avatar from the host.
    async fn user_info(&self) -> Result<HostUserInfo, AuthError>;

    /// Fetch the verified phone number from the host.
    async fn phone_number(&self) -> Result<String, AuthError>;
}

/// In-memory identity snapshot mirrored to the persistent store, so the
/// completeness check on the token fast path does no I/O.
pub struct IdentityCache {
    current: Mutex<CachedIdentity>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(CachedIdentity::default()),
        }
    }

    fn current(&self) -> MutexGuard<'_, CachedIdentity> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the cached identity.
    pub fn cached(&self) -> CachedIdentity {
        self.current().clone()
    }

    pub fn is_complete(&self) -> bool {
        self.current().is_complete()
    }

    /// Load the persisted identity into memory. Returns whether a complete
    /// identity was restored; partial blobs are kept (they force
    /// re-acquisition later) and parse failures are treated as absent.
    pub async fn restore(&self, store: &dyn KeyValueStore) -> Result<bool> {
        let Some(raw) = store.get(IDENTITY_KEY).await? else {
            return Ok(false);
        };
        match serde_json::from_str::<CachedIdentity>(&raw) {
            Ok(identity) => {
                let complete = identity.is_complete();
                *self.current() = identity;
                debug!(complete, "Restored cached identity");
                Ok(complete)
            }
            Err(err) => {
                warn!(error = %err, "Failed to parse cached identity, ignoring");
                Ok(false)
            }
        }
    }

    /// Run the host identity flow: ensure permissions, fetch name and phone,
    /// update memory and persist. Storage failures are logged, not fatal:
    /// the in-memory identity still drives this process.
    pub async fn refresh_from_host(
        &self,
        provider: &dyn IdentityProvider,
        store: &dyn KeyValueStore,
    ) -> Result<CachedIdentity, AuthError> {
        provider.request_permissions().await?;

        let info = provider.user_info().await?;
        let phone = provider.phone_number().await?;

        let identity = CachedIdentity {
            user_id: Some(info.id),
            display_name: Some(info.name),
            avatar_url: info.avatar,
            phone_number: Some(phone),
        };
        *self.current() = identity.clone();

        if let Err(err) = self.persist(&identity, store).await {
            warn!(error = %err, "Failed to persist identity cache");
        }
        Ok(identity)
    }

    async fn persist(&self, identity: &CachedIdentity, store: &dyn KeyValueStore) -> Result<()> {
        let raw = serde_json::to_string(identity).context("Failed to serialize identity")?;
        store.set(IDENTITY_KEY, &raw).await
    }

    /// Drop the identity from memory and storage.
    pub async fn clear(&self, store: &dyn KeyValueStore) -> Result<()> {
        *self.current() = CachedIdentity::default();
        store.remove(IDENTITY_KEY).await
    }
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_is_complete() {
        let mut identity = CachedIdentity {
            user_id: Some("273754147305996554".to_string()),
            display_name: Some("Linh".to_string()),
            avatar_url: None,
            phone_number: Some("+84900000000".to_string()),
        };
        assert!(identity.is_complete());

        identity.display_name = Some(String::new());
        assert!(!identity.is_complete());

        identity.display_name = Some("Linh".to_string());
        identity.phone_number = None;
        assert!(!identity.is_complete());
    }

    #[tokio::test]
    async fn test_restore_missing_blob() {
        let cache = IdentityCache::new();
        let store = MemoryStore::new();
        assert!(!cache.restore(&store).await.unwrap());
        assert!(!cache.is_complete());
    }

    #[tokio::test]
    async fn test_restore_partial_blob_kept_but_incomplete() {
        let store = MemoryStore::new();
        store
            .set("user_data", r#"{"display_name": "Linh"}"#)
            .await
            .unwrap();

        let cache = IdentityCache::new();
        assert!(!cache.restore(&store).await.unwrap());
        assert_eq!(cache.cached().display_name.as_deref(), Some("Linh"));
        assert!(!cache.is_complete());
    }

    #[tokio::test]
    async fn test_restore_garbage_blob_ignored() {
        let store = MemoryStore::new();
        store.set("user_data", "not json").await.unwrap();

        let cache = IdentityCache::new();
        assert!(!cache.restore(&store).await.unwrap());
        assert!(cache.cached().display_name.is_none());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = MemoryStore::new();
        let cache = IdentityCache::new();
        cache.clear(&store).await.unwrap();
        cache.clear(&store).await.unwrap();
        assert!(!cache.is_complete());
    }
}
