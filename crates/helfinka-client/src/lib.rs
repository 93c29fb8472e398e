//! Helfinka Client - HTTP SDK for the Helfinka health diary API
//!
//! A single [`HttpClient`] owns the connection pool and the
//! [`AuthInterceptor`]; the per-area APIs borrow it:
//!
//! - [`AuthApi`] - login, logout, health check and version
//! - [`EntriesApi`] - list, create and delete diary entries
//! - [`UsersApi`] - profile and password changes
//!
//! The bearer token is pulled from a registered [`CredentialSource`] on
//! every request, and 401/403 responses are reported to the registered
//! [`UnauthorizedHandler`]. Requests are never retried.

pub mod auth;
pub mod config;
pub mod entries;
pub mod error;
pub mod interceptor;
pub mod metrics;
pub mod transport;
pub mod users;

pub use auth::AuthApi;
pub use config::{ApiEnvironment, ClientConfig, ClientConfigBuilder, ConfigError};
pub use entries::EntriesApi;
pub use error::ClientError;
pub use interceptor::{AuthInterceptor, Credential, CredentialSource, StaticToken, UnauthorizedHandler};
pub use transport::HttpClient;
pub use users::UsersApi;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
