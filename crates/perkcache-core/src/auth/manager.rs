//! Session lifecycle: token acquisition, caching with expiry, single-flight
//! de-duplication of concurrent acquisitions, invalidation and forced
//! refresh.
//!
//! The manager owns the only mutable session state in the crate. Collaborators
//! are injected: the host identity provider, the auth backend and the
//! persistent store, so the whole flow runs against fakes in tests and
//! against the real shell in production.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::models::{LoginRequest, LoginResponse};
use crate::storage::KeyValueStore;

use super::identity::{CachedIdentity, IdentityCache, IdentityProvider};
use super::session::SessionData;
use super::AuthError;

/// Exchanges host identity plus the shared application secret for a bearer
/// token. Implemented by `ApiClient` over `POST /auth/login`.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn exchange(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError>;
}

type TokenResult = Result<String, AuthError>;

struct AuthState {
    session: Option<SessionData>,
    /// True while an acquisition is in flight. Set under the lock before the
    /// first suspension point, so no second flow can start in between.
    authenticating: bool,
    /// Callers queued behind the in-flight acquisition, resolved together
    /// in registration order.
    waiters: Vec<oneshot::Sender<TokenResult>>,
}

impl AuthState {
    /// Token that can be served with no I/O: present, within TTL, and the
    /// cached identity is complete.
    fn serveable_token(&self, identity: &IdentityCache) -> Option<String> {
        let session = self.session.as_ref()?;
        if !session.is_expired() && identity.is_complete() {
            Some(session.token.clone())
        } else {
            None
        }
    }
}

/// What a `get_valid_token` caller does after inspecting the state under
/// the lock.
enum Next {
    Ready(String),
    Wait(oneshot::Receiver<TokenResult>),
    Acquire { clear_persisted: bool },
}

pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    backend: Arc<dyn AuthBackend>,
    store: Arc<dyn KeyValueStore>,
    identity: IdentityCache,
    secret_key: String,
    state: Mutex<AuthState>,
}

impl SessionManager {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        backend: Arc<dyn AuthBackend>,
        store: Arc<dyn KeyValueStore>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            backend,
            store,
            identity: IdentityCache::new(),
            secret_key: secret_key.into(),
            state: Mutex::new(AuthState {
                session: None,
                authenticating: false,
                waiters: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Restore session and identity from the persistent store. An expired
    /// session is cleared instead of restored.
    pub async fn restore(&self) -> anyhow::Result<()> {
        if let Some(session) = SessionData::load(self.store.as_ref()).await? {
            if session.is_expired() {
                debug!("Persisted session expired, clearing");
                SessionData::clear(self.store.as_ref()).await?;
            } else {
                info!("Restored persisted session");
                self.state().session = Some(session);
            }
        }
        self.identity.restore(self.store.as_ref()).await?;
        Ok(())
    }

    /// Return a currently-valid token, acquiring one if needed.
    ///
    /// An in-memory token within its TTL whose cached identity is complete is
    /// returned immediately with no I/O. Otherwise the caller either joins
    /// the acquisition already in flight or starts one; every caller queued
    /// behind the same attempt observes its result, and no second backend
    /// call is made.
    pub async fn get_valid_token(&self) -> TokenResult {
        let next = {
            let mut state = self.state();
            if let Some(token) = state.serveable_token(&self.identity) {
                Next::Ready(token)
            } else if state.authenticating {
                debug!("Acquisition in flight, queueing caller");
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Next::Wait(rx)
            } else {
                // An expired token, or a valid one paired with an incomplete
                // identity, is dropped before re-acquiring.
                let clear_persisted = state.session.take().is_some();
                state.authenticating = true;
                Next::Acquire { clear_persisted }
            }
        };

        match next {
            Next::Ready(token) => Ok(token),
            Next::Wait(rx) => Self::await_waiter(rx).await,
            Next::Acquire { clear_persisted } => {
                if clear_persisted {
                    if let Err(err) = SessionData::clear(self.store.as_ref()).await {
                        warn!(error = %err, "Failed to clear persisted session");
                    }
                }
                self.acquire().await
            }
        }
    }

    /// Forced re-login: clear the current session, then acquire. Joins an
    /// acquisition already in flight rather than starting a second one.
    pub async fn refresh_token(&self) -> TokenResult {
        self.clear_token().await;

        let pending = {
            let mut state = self.state();
            if state.authenticating {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.authenticating = true;
                None
            }
        };

        match pending {
            Some(rx) => Self::await_waiter(rx).await,
            None => self.acquire().await,
        }
    }

    /// Clear the in-memory and persisted token and identity. Idempotent;
    /// storage failures are logged, the in-memory state is gone regardless.
    pub async fn clear_token(&self) {
        self.state().session = None;
        if let Err(err) = SessionData::clear(self.store.as_ref()).await {
            warn!(error = %err, "Failed to clear persisted session");
        }
        if let Err(err) = self.identity.clear(self.store.as_ref()).await {
            warn!(error = %err, "Failed to clear identity cache");
        }
    }

    /// Whether a token is present and within its TTL. No I/O.
    pub fn is_token_valid(&self) -> bool {
        self.state()
            .session
            .as_ref()
            .is_some_and(|session| !session.is_expired())
    }

    /// The current token, if any, regardless of validity.
    pub fn token(&self) -> Option<String> {
        self.state().session.as_ref().map(|s| s.token.clone())
    }

    pub fn is_authenticating(&self) -> bool {
        self.state().authenticating
    }

    /// Snapshot of the cached identity, for display fallbacks.
    pub fn cached_identity(&self) -> CachedIdentity {
        self.identity.cached()
    }

    async fn await_waiter(rx: oneshot::Receiver<TokenResult>) -> TokenResult {
        match rx.await {
            Ok(result) => result,
            // Only possible if the acquiring caller was dropped mid-flight
            Err(_) => Err(AuthError::Provider(
                "acquisition ended without a result".to_string(),
            )),
        }
    }

    /// Run one acquisition to completion and fan the result out to every
    /// queued waiter. Callers must have set `authenticating` first.
    async fn acquire(&self) -> TokenResult {
        let result = self.run_login_flow().await;

        let waiters = {
            let mut state = self.state();
            state.authenticating = false;
            if let Ok(ref session) = result {
                state.session = Some(session.clone());
            }
            std::mem::take(&mut state.waiters)
        };

        let outcome = result.map(|session| session.token);
        for waiter in waiters {
            // A waiter that stopped listening is not our problem
            let _ = waiter.send(outcome.clone());
        }
        outcome
    }

    /// The acquisition flow: permissions, identity fetch, token exchange,
    /// persist. Fails without persisting partial state; the failed attempt
    /// is only re-triggered by a later call.
    async fn run_login_flow(&self) -> Result<SessionData, AuthError> {
        debug!("Starting token acquisition");

        let identity = self
            .identity
            .refresh_from_host(self.provider.as_ref(), self.store.as_ref())
            .await?;

        let name = identity
            .display_name
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::IncompleteIdentity("display name".to_string()))?;
        let phone = identity
            .phone_number
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::IncompleteIdentity("phone number".to_string()))?;

        let request = LoginRequest {
            phone,
            secret_key: self.secret_key.clone(),
            name,
        };
        let login = self.backend.exchange(&request).await?;

        let session = SessionData::issued_now(login.token);
        if let Err(err) = session.save(self.store.as_ref()).await {
            warn!(error = %err, "Failed to persist session");
        }
        info!("Token acquired");
        Ok(session)
    }
}
