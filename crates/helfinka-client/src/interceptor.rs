//! Request interceptors
//!
//! Every outgoing request asks the registered [`CredentialSource`] for the
//! current bearer token at send time, so a token swapped mid-session is
//! picked up by the next request. A 401/403 response is reported to the
//! registered [`UnauthorizedHandler`] together with the session epoch the
//! request was sent under.

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::RequestBuilder;

/// Header carrying the per-request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Bearer token plus the session epoch it belongs to
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    epoch: u64,
}

impl Credential {
    pub fn new(token: impl Into<String>, epoch: u64) -> Self {
        Self {
            token: token.into(),
            epoch,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("epoch", &self.epoch)
            .finish()
    }
}

/// Supplies the credential for each outgoing request
pub trait CredentialSource: Send + Sync {
    /// Current credential, or `None` to send the request unauthenticated
    fn credential(&self) -> Option<Credential>;
}

/// Reacts to 401/403 responses.
///
/// Called from inside request completion; implementations must not block
/// on network I/O.
pub trait UnauthorizedHandler: Send + Sync {
    /// `epoch` is the session epoch the rejected request was sent under,
    /// or `None` if it was sent without a credential.
    fn on_unauthorized(&self, epoch: Option<u64>);
}

/// A fixed token, for scripts and tests that manage no session
#[derive(Clone)]
pub struct StaticToken(pub String);

impl CredentialSource for StaticToken {
    fn credential(&self) -> Option<Credential> {
        Some(Credential::new(self.0.clone(), 0))
    }
}

/// Interceptor that adds the bearer token and a request ID to requests and
/// routes unauthorized responses to the registered handler.
#[derive(Default)]
pub struct AuthInterceptor {
    credentials: RwLock<Option<Arc<dyn CredentialSource>>>,
    unauthorized: RwLock<Option<Arc<dyn UnauthorizedHandler>>>,
}

impl AuthInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the credential source, replacing any previous one
    pub fn set_credential_source(&self, source: Arc<dyn CredentialSource>) {
        *self.credentials.write() = Some(source);
    }

    /// Send subsequent requests unauthenticated
    pub fn clear_credential_source(&self) {
        *self.credentials.write() = None;
    }

    /// Register the unauthorized handler, replacing any previous one
    pub fn set_unauthorized_handler(&self, handler: Arc<dyn UnauthorizedHandler>) {
        *self.unauthorized.write() = Some(handler);
    }

    pub fn clear_unauthorized_handler(&self) {
        *self.unauthorized.write() = None;
    }

    /// Check if a credential source is registered
    pub fn has_credential_source(&self) -> bool {
        self.credentials.read().is_some()
    }

    /// Decorate a request. Returns the epoch of the credential used, if any.
    pub fn apply(&self, request: RequestBuilder) -> (RequestBuilder, Option<u64>) {
        let source = self.credentials.read().clone();
        let credential = source.and_then(|source| source.credential());

        let request = self.tag(request);

        match credential {
            Some(credential) => (
                request.bearer_auth(credential.token()),
                Some(credential.epoch()),
            ),
            None => (request, None),
        }
    }

    /// Add only the request ID header
    pub fn tag(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string())
    }

    /// Report a 401/403 response
    pub fn notify_unauthorized(&self, epoch: Option<u64>) {
        // Clone out of the lock so the handler may re-register hooks.
        let handler = self.unauthorized.read().clone();
        match handler {
            Some(handler) => handler.on_unauthorized(epoch),
            None => tracing::debug!("Unauthorized response with no handler registered"),
        }
    }
}

impl std::fmt::Debug for AuthInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInterceptor")
            .field("has_credential_source", &self.has_credential_source())
            .field("has_unauthorized_handler", &self.unauthorized.read().is_some())
            .finish()
    }
}
