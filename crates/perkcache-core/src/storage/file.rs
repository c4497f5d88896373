use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::KeyValueStore;

/// File-per-key store under a directory, for running outside the host shell.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage entry {}", key))?;
        Ok(Some(contents))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write storage entry {}", key))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage entry {}", key))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> FileStore {
        let dir = std::env::temp_dir()
            .join("perkcache-tests")
            .join(format!("{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        FileStore::new(dir).expect("Failed to create temp store")
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = temp_store("set-get-remove");
        assert_eq!(store.get("auth_token").await.unwrap(), None);

        store.set("auth_token", "tok_abc").await.unwrap();
        assert_eq!(
            store.get("auth_token").await.unwrap(),
            Some("tok_abc".to_string())
        );

        store.remove("auth_token").await.unwrap();
        assert_eq!(store.get("auth_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let store = temp_store("remove-missing");
        store.remove("never_set").await.unwrap();
    }

    #[tokio::test]
    async fn test_overwrite_value() {
        let store = temp_store("overwrite");
        store.set("auth_time", "100").await.unwrap();
        store.set("auth_time", "200").await.unwrap();
        assert_eq!(
            store.get("auth_time").await.unwrap(),
            Some("200".to_string())
        );
    }
}
