//! HTTP transport
//!
//! Thin wrapper around `reqwest` that applies the [`AuthInterceptor`] to
//! every request, maps statuses onto [`ClientError`] and records metrics.
//! Requests are never retried.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::interceptor::{AuthInterceptor, CredentialSource, UnauthorizedHandler};
use crate::metrics::{Api, Outcome, RequestTimer};
use crate::{AuthApi, ClientConfig, ClientError, EntriesApi, Result, UsersApi};

/// Longest response body kept in a [`ClientError::Status`] message
const MAX_ERROR_BODY_LEN: usize = 512;

/// Shared HTTP client for all Helfinka APIs.
///
/// Cheap to clone; clones share the connection pool and interceptor.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    interceptor: Arc<AuthInterceptor>,
}

impl HttpClient {
    /// Create a client with a connection pool configured from `config`
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| ClientError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                timeout: false,
            })?;

        Ok(Self::with_client(config, http))
    }

    /// Create a client around an existing `reqwest::Client`
    pub fn with_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            config: Arc::new(config),
            interceptor: Arc::new(AuthInterceptor::new()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn interceptor(&self) -> &AuthInterceptor {
        &self.interceptor
    }

    /// Register where bearer tokens come from
    pub fn set_credential_source(&self, source: Arc<dyn CredentialSource>) {
        self.interceptor.set_credential_source(source);
    }

    /// Register what happens on 401/403
    pub fn set_unauthorized_handler(&self, handler: Arc<dyn UnauthorizedHandler>) {
        self.interceptor.set_unauthorized_handler(handler);
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    pub fn entries(&self) -> EntriesApi {
        EntriesApi::new(self.clone())
    }

    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    /// Send an authenticated request and decode a JSON response body
    pub(crate) async fn fetch_json<T: DeserializeOwned>(
        &self,
        api: Api,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.execute(api, operation, request, true).await?;
        decode_json(operation, response).await
    }

    /// Send an authenticated request and discard the response body
    pub(crate) async fn fetch_empty(
        &self,
        api: Api,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<()> {
        self.execute(api, operation, request, true).await.map(drop)
    }

    /// Send a request without a bearer token. A 401/403 is returned as
    /// [`ClientError::Unauthorized`] but never reported to the handler.
    pub(crate) async fn fetch_json_anonymous<T: DeserializeOwned>(
        &self,
        api: Api,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.execute(api, operation, request, false).await?;
        decode_json(operation, response).await
    }

    pub(crate) fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.http.request(method, url)
    }

    async fn execute(
        &self,
        api: Api,
        operation: &'static str,
        request: RequestBuilder,
        authenticate: bool,
    ) -> Result<Response> {
        let (request, epoch) = if authenticate {
            self.interceptor.apply(request)
        } else {
            (self.interceptor.tag(request), None)
        };
        let timer = RequestTimer::start(api, operation);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let outcome = if e.is_timeout() {
                    Outcome::Timeout
                } else {
                    Outcome::Error
                };
                timer.finish(outcome);
                tracing::error!(operation, error = %e, "Request failed");
                return Err(e.into());
            }
        };

        let status = response.status();
        if status.is_success() {
            timer.finish(Outcome::Success);
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            timer.finish(Outcome::Unauthorized);
            tracing::debug!(operation, status = status.as_u16(), ?epoch, "Request unauthorized");
            if authenticate {
                self.interceptor.notify_unauthorized(epoch);
            }
            return Err(ClientError::Unauthorized {
                status: status.as_u16(),
            });
        }

        timer.finish(Outcome::Error);
        let body = response.text().await.unwrap_or_default();
        let message: String = body.chars().take(MAX_ERROR_BODY_LEN).collect();
        tracing::error!(operation, status = status.as_u16(), body = %message, "Request returned error status");

        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode_json<T: DeserializeOwned>(operation: &'static str, response: Response) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        tracing::error!(operation, error = %e, "Failed to decode response body");
        ClientError::from(e)
    })
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("interceptor", &self.interceptor)
            .finish_non_exhaustive()
    }
}
