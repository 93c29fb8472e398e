//! Client errors
//!
//! Error types for Helfinka API calls, with the user-facing message each
//! one maps to.

use helfinka_types::ValidationError;
use thiserror::Error;

use crate::config::ConfigError;

/// Client errors for Helfinka operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Payload failed validation; nothing was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Network failure, timeout, or connection refused.
    #[error("transport error: {message}")]
    Transport {
        /// Error message
        message: String,
        /// Whether the request timed out
        timeout: bool,
    },

    /// The service answered with a non-success status other than 401/403.
    #[error("unexpected status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        message: String,
    },

    /// The service rejected the session (401 or 403).
    #[error("unauthorized ({status})")]
    Unauthorized {
        /// HTTP status code
        status: u16,
    },

    /// Login was rejected.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Returns true if the session was rejected by the service.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// HTTP status code, if the error came from a response.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Unauthorized { status } => Some(*status),
            Self::InvalidCredentials => Some(401),
            _ => None,
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// Transport details are left out; the cause is logged where the
    /// error is raised.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Unauthorized { .. } => "Your session has ended. Please log in again.".to_string(),
            Self::InvalidCredentials => "Invalid email or password.".to_string(),
            Self::Transport { .. }
            | Self::Status { .. }
            | Self::Serialization(_)
            | Self::Config(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Serialization(err.to_string());
        }
        Self::Transport {
            message: err.to_string(),
            timeout: err.is_timeout(),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
