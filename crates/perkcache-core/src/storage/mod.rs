//! Persistent key/value storage behind the session and identity caches.
//!
//! Inside the mini app shell this seam is backed by the host's native
//! storage; the crate ships a file-backed store for running outside the
//! shell and an in-memory store for tests.

pub mod file;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Durable string key/value storage. All operations are asynchronous:
/// host-backed implementations suspend on the native bridge.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}
