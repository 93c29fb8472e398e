//! Auth API
//!
//! Login, logout and the unauthenticated service probes.

use helfinka_types::{ApiVersionInfo, HelloResponse, LoginRequest, LoginResponse};
use reqwest::Method;
use tracing::instrument;

use crate::metrics::Api;
use crate::{ClientError, HttpClient, Result};

/// Client for `/auth/*`, `/hello` and `/version`
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: HttpClient,
}

impl AuthApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a token and the user's profile.
    ///
    /// Sent without a bearer token. A 401/403 answer is reported as
    /// [`ClientError::InvalidCredentials`] and never ends an existing session.
    #[instrument(skip(self, request), fields(email = %request.email), level = "debug")]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        let request = request.validate()?;
        let builder = self
            .client
            .request(Method::POST, self.client.config().url("/auth/login"))
            .json(&request);

        match self
            .client
            .fetch_json_anonymous(Api::Auth, "login", builder)
            .await
        {
            Err(ClientError::Unauthorized { .. }) => Err(ClientError::InvalidCredentials),
            other => other,
        }
    }

    /// Ask the service to invalidate the current token.
    ///
    /// Failures are logged and otherwise ignored; the local session is
    /// cleared regardless.
    #[instrument(skip(self), level = "debug")]
    pub async fn logout(&self) {
        let builder = self
            .client
            .request(Method::POST, self.client.config().url("/auth/logout"));

        if let Err(e) = self.client.fetch_empty(Api::Auth, "logout", builder).await {
            tracing::warn!(error = %e, "Remote logout failed");
        }
    }

    /// Health check
    pub async fn hello(&self) -> Result<HelloResponse> {
        let builder = self
            .client
            .request(Method::GET, self.client.config().url("/hello"));
        self.client.fetch_json(Api::Meta, "hello", builder).await
    }

    /// Deployed API version
    pub async fn version(&self) -> Result<ApiVersionInfo> {
        let builder = self
            .client
            .request(Method::GET, self.client.config().url("/version"));
        self.client.fetch_json(Api::Meta, "version", builder).await
    }
}
