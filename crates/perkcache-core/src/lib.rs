//! Core library for perkcache, a client for loyalty/rewards mini apps:
//! voucher catalog, point wallet, redemption and member profile over a REST
//! backend, with the identity-for-token session flow the host shell
//! requires.
//!
//! The host shell plugs in at two seams: [`auth::IdentityProvider`] for
//! native identity (display name, avatar, verified phone number) and
//! [`storage::KeyValueStore`] for durable storage. [`auth::SessionManager`]
//! coordinates the token lifecycle on top of them — single-flight
//! acquisition, 24-hour expiry, restore across restarts — and
//! [`api::ApiClient`] talks to the backend with the resulting bearer token.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthBackend, AuthError, IdentityProvider, SessionManager};
pub use cache::CacheManager;
pub use config::Config;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
