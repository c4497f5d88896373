//! Application configuration management.
//!
//! Configuration is stored at `~/.config/perkcache/config.json` and every
//! field can be overridden from the environment (`.env` files are honored).
//! The shared application secret is deliberately not part of the file: it
//! comes from `PERKCACHE_SECRET_KEY` or the OS keychain.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::SecretStore;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "perkcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "https://mini.alwaysdata.net/api/v1";
const DEFAULT_STORAGE_BASE_URL: &str = "https://mini.alwaysdata.net/storage";
const DEFAULT_APP_ID: &str = "1";

const ENV_API_BASE_URL: &str = "PERKCACHE_API_BASE_URL";
const ENV_STORAGE_BASE_URL: &str = "PERKCACHE_STORAGE_BASE_URL";
const ENV_APP_ID: &str = "PERKCACHE_APP_ID";
const ENV_SECRET_KEY: &str = "PERKCACHE_SECRET_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_storage_base_url")]
    pub storage_base_url: String,
    #[serde(default = "default_app_id")]
    pub app_id: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_storage_base_url() -> String {
    DEFAULT_STORAGE_BASE_URL.to_string()
}

fn default_app_id() -> String {
    DEFAULT_APP_ID.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            storage_base_url: default_storage_base_url(),
            app_id: default_app_id(),
        }
    }
}

impl Config {
    /// Load the config file if present, then apply environment overrides.
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(url) = env_override(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(url) = env_override(ENV_STORAGE_BASE_URL) {
            self.storage_base_url = url;
        }
        if let Some(app_id) = env_override(ENV_APP_ID) {
            self.app_id = app_id;
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Per-app cache directory for the data cache and the file-backed store.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(&self.app_id))
    }

    /// Directory for the file-backed key/value store.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join("storage"))
    }

    /// Resolve the shared application secret: environment first, then the
    /// OS keychain entry for this app id.
    pub fn secret_key(&self) -> Result<String> {
        if let Some(secret) = env_override(ENV_SECRET_KEY) {
            return Ok(secret);
        }
        SecretStore::get(&self.app_id).with_context(|| {
            format!(
                "No application secret: set {} or store one in the keychain",
                ENV_SECRET_KEY
            )
        })
    }
}

fn env_override(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|value| !value.is_empty())
}
