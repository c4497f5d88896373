use serde::{Deserialize, Serialize};

use super::{Profile, User};

/// Body of `POST /auth/login`: host-provided identity plus the shared
/// application secret.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub phone: String,
    pub secret_key: String,
    pub name: String,
}

// Manual Debug so the shared secret never lands in logs.
impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("phone", &self.phone)
            .field("secret_key", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// Successful exchange: the bearer token plus the account and profile the
/// backend resolved for this identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub profile: Profile,
    pub token: String,
}
