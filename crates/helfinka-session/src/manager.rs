//! Session lifecycle
//!
//! [`SessionManager`] owns the logged-in state of the client. It is built
//! once with a [`KeyValueStore`] and an [`AuthBackend`], then attached to an
//! [`HttpClient`] so that every request pulls the current token from it and
//! every 401/403 response ends the session.
//!
//! Each installed session gets a new epoch. A credential handed to the
//! transport carries the epoch it was issued under, and a rejection only
//! tears down the session when that epoch is still current; a late 401 for
//! a request sent before a re-login leaves the new session alone.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use helfinka_client::{AuthApi, ClientError, Credential, CredentialSource, HttpClient, UnauthorizedHandler};
use helfinka_types::{LoginRequest, LoginResponse, User};
use parking_lot::RwLock;
use tokio::sync::watch;

use crate::token::is_token_expired;
use crate::{KeyValueStore, SessionError, SessionStore, StoredSession};

/// Where the client stands with respect to login
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionStatus {
    /// Persisted state has not been read yet
    #[default]
    Unknown,
    Authenticated,
    Anonymous,
}

/// Remote side of login and logout
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ClientError>;

    /// Best effort; failures are the backend's to log
    async fn logout(&self);
}

#[async_trait]
impl AuthBackend for AuthApi {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ClientError> {
        AuthApi::login(self, request).await
    }

    async fn logout(&self) {
        AuthApi::logout(self).await
    }
}

#[derive(Debug, Default)]
struct SessionState {
    status: SessionStatus,
    session: Option<StoredSession>,
    epoch: u64,
}

/// State shared between the manager and the transport hooks
struct SessionShared {
    store: SessionStore,
    state: RwLock<SessionState>,
    status_tx: watch::Sender<SessionStatus>,
}

impl SessionShared {
    fn install(&self, session: StoredSession) -> u64 {
        let epoch = {
            let mut state = self.state.write();
            self.store.save(&session);
            state.epoch += 1;
            state.session = Some(session);
            state.status = SessionStatus::Authenticated;
            state.epoch
        };
        self.status_tx.send_replace(SessionStatus::Authenticated);
        epoch
    }

    /// Drop the session locally. Never touches the network.
    fn teardown(&self) {
        {
            let mut state = self.state.write();
            Self::clear(&self.store, &mut state);
        }
        self.status_tx.send_replace(SessionStatus::Anonymous);
    }

    /// Drop the session only if it is still the one issued under `epoch`.
    /// Check and clear share one write lock.
    fn teardown_if_current(&self, epoch: u64) -> bool {
        {
            let mut state = self.state.write();
            if state.session.is_none() || state.epoch != epoch {
                return false;
            }
            Self::clear(&self.store, &mut state);
        }
        self.status_tx.send_replace(SessionStatus::Anonymous);
        true
    }

    fn clear(store: &SessionStore, state: &mut SessionState) {
        store.clear();
        state.session = None;
        state.status = SessionStatus::Anonymous;
    }
}

impl CredentialSource for SessionShared {
    fn credential(&self) -> Option<Credential> {
        let state = self.state.read();
        state
            .session
            .as_ref()
            .map(|session| Credential::new(session.token.clone(), state.epoch))
    }
}

impl UnauthorizedHandler for SessionShared {
    fn on_unauthorized(&self, epoch: Option<u64>) {
        let Some(epoch) = epoch else {
            return;
        };

        if self.teardown_if_current(epoch) {
            tracing::info!(epoch, "Session rejected by the service, logging out");
        } else {
            tracing::debug!(epoch, "Ignoring rejection of a previous session");
        }
    }
}

/// Client session manager
#[derive(Clone)]
pub struct SessionManager {
    shared: Arc<SessionShared>,
    backend: Arc<dyn AuthBackend>,
}

impl SessionManager {
    /// Create a manager in [`SessionStatus::Unknown`]; call
    /// [`SessionManager::restore`] before use.
    pub fn new(storage: Arc<dyn KeyValueStore>, backend: Arc<dyn AuthBackend>) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Unknown);
        Self {
            shared: Arc::new(SessionShared {
                store: SessionStore::new(storage),
                state: RwLock::new(SessionState::default()),
                status_tx,
            }),
            backend,
        }
    }

    /// Manager that logs in through `client` and is attached to it
    pub fn for_client(storage: Arc<dyn KeyValueStore>, client: &HttpClient) -> Self {
        let manager = Self::new(storage, Arc::new(client.auth()));
        manager.attach(client);
        manager
    }

    /// Supply tokens to `client` and end the session on its 401/403s
    pub fn attach(&self, client: &HttpClient) {
        client.set_credential_source(self.shared.clone());
        client.set_unauthorized_handler(self.shared.clone());
    }

    /// Load the persisted session, discarding it if the token has expired
    pub fn restore(&self) -> SessionStatus {
        self.restore_at(Utc::now())
    }

    /// [`SessionManager::restore`] against an explicit clock
    pub fn restore_at(&self, now: DateTime<Utc>) -> SessionStatus {
        match self.shared.store.load() {
            Some(session) if !is_token_expired(&session.token, now) => {
                tracing::debug!(user_id = %session.user.id, "Restored session");
                self.shared.install(session);
                SessionStatus::Authenticated
            }
            stored => {
                if stored.is_some() {
                    tracing::debug!("Discarding expired session");
                }
                self.shared.teardown();
                SessionStatus::Anonymous
            }
        }
    }

    /// Log in and persist the session.
    ///
    /// On failure the current state and storage are left as they were.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let request = LoginRequest::new(email, password).validate()?;
        let response = self.backend.login(request).await?;

        let user = response.user.clone();
        self.shared.install(StoredSession {
            token: response.token,
            user: response.user,
        });
        tracing::info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Log out remotely if there is a session, then always clear local
    /// state. Safe to call when already logged out.
    pub async fn logout(&self) {
        let has_session = self.shared.state.read().session.is_some();
        if has_session {
            self.backend.logout().await;
        }
        self.shared.teardown();
        tracing::info!("Logged out");
    }

    /// Clear the session locally without telling the service
    pub fn end_session(&self) {
        self.shared.teardown();
    }

    /// Replace the cached profile, keeping the token.
    ///
    /// Returns `false` and changes nothing when logged out.
    pub fn update_user(&self, user: User) -> bool {
        let mut state = self.shared.state.write();
        match state.session.as_mut() {
            Some(session) => {
                session.user = user;
                self.shared.store.save(session);
                true
            }
            None => {
                tracing::debug!("Ignoring profile update without a session");
                false
            }
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.state.read().status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    pub fn current_user(&self) -> Option<User> {
        let state = self.shared.state.read();
        state.session.as_ref().map(|session| session.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        let state = self.shared.state.read();
        state.session.as_ref().map(|session| session.token.clone())
    }

    /// Credential the transport would send right now
    pub fn credential(&self) -> Option<Credential> {
        self.shared.credential()
    }

    /// Receiver that observes every status change
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.shared.status_tx.subscribe()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
