use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{Category, Profile, Voucher, WalletItem};

/// Consider cache stale after 30 minutes.
/// Voucher stock and point balances move faster than the catalog itself;
/// 30 minutes keeps offline views useful without hammering the API.
const CACHE_STALE_MINUTES: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Covers clock skew too
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// Disk cache for slowly-changing API data, so screens can render behind a
/// pending or failed login instead of blocking.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }

    // ===== Categories =====

    pub fn load_categories(&self) -> Result<Option<CachedData<Vec<Category>>>> {
        self.load("categories")
    }

    pub fn save_categories(&self, categories: &[Category]) -> Result<()> {
        self.save("categories", &categories)
    }

    // ===== Latest vouchers =====

    pub fn load_latest_vouchers(&self) -> Result<Option<CachedData<Vec<Voucher>>>> {
        self.load("latest_vouchers")
    }

    pub fn save_latest_vouchers(&self, vouchers: &[Voucher]) -> Result<()> {
        self.save("latest_vouchers", &vouchers)
    }

    // ===== Profile =====

    pub fn load_profile(&self) -> Result<Option<CachedData<Profile>>> {
        self.load("profile")
    }

    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        self.save("profile", profile)
    }

    // ===== Wallet =====

    pub fn load_wallet(&self) -> Result<Option<CachedData<Vec<WalletItem>>>> {
        self.load("wallet")
    }

    pub fn save_wallet(&self, items: &[WalletItem]) -> Result<()> {
        self.save("wallet", &items)
    }

    // ===== Staleness =====

    /// Helper to check staleness and log errors without failing
    fn is_cache_stale<T>(
        &self,
        name: &str,
        loader: impl FnOnce() -> Result<Option<CachedData<T>>>,
    ) -> bool {
        match loader() {
            Ok(Some(cached)) => cached.is_stale(),
            Ok(None) => true, // No cache = stale
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for staleness check");
                true // Error reading = treat as stale
            }
        }
    }

    /// Check if any of the cached data is stale enough to refresh
    pub fn any_stale(&self) -> bool {
        let stale_checks = [
            self.is_cache_stale("categories", || self.load_categories()),
            self.is_cache_stale("latest_vouchers", || self.load_latest_vouchers()),
            self.is_cache_stale("profile", || self.load_profile()),
            self.is_cache_stale("wallet", || self.load_wallet()),
        ];
        stale_checks.iter().any(|&stale| stale)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_age_display_rounding() {
        let mut cached = CachedData::new(vec![1]);
        cached.cached_at = Utc::now() - Duration::minutes(5);
        assert_eq!(cached.age_display(), "5m ago");

        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago"); // 1h 35m rounds up

        cached.cached_at = Utc::now() - Duration::days(2);
        assert_eq!(cached.age_display(), "2d ago");
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale());

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(CACHE_STALE_MINUTES + 1);
        assert!(old.is_stale());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = std::env::temp_dir()
            .join("perkcache-tests")
            .join(format!("cache-roundtrip-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let cache = CacheManager::new(dir).expect("Failed to create cache dir");

        assert!(cache.load_categories().unwrap().is_none());
        assert!(cache.any_stale());

        let categories = vec![Category {
            id: 4,
            app_id: 1,
            name: "Ăn uống".to_string(),
            description: None,
            icon: None,
            active: true,
            created_at: None,
            updated_at: None,
        }];
        cache.save_categories(&categories).unwrap();

        let loaded = cache
            .load_categories()
            .unwrap()
            .expect("categories should be cached");
        assert_eq!(loaded.data.len(), 1);
        assert_eq!(loaded.data[0].name, "Ăn uống");
        assert!(!loaded.is_stale());
    }
}
