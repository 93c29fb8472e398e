//! Authentication types

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{User, ValidationError};

/// Login request
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Reject obviously unusable credentials before they hit the network
    pub fn validate(self) -> Result<Self, ValidationError> {
        let email = self.email.trim().to_string();
        if email.is_empty() {
            return Err(ValidationError::new("email", "must not be empty"));
        }
        if !crate::api::is_valid_email(&email) {
            return Err(ValidationError::new("email", "must be a valid email address"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::new("password", "must not be empty"));
        }
        Ok(Self {
            email,
            password: self.password,
        })
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    /// Profile of the logged-in user
    pub user: User,
}

/// Claims carried in the payload segment of the session token.
///
/// Every claim is optional here: the client only inspects the token to
/// decide whether it has expired, and a missing `exp` means expired. A claim
/// of an unexpected JSON type reads as absent instead of failing the decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Subject (user ID)
    #[serde(default, deserialize_with = "lenient")]
    pub sub: Option<String>,
    /// Email address
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,
    /// Display name
    #[serde(default, deserialize_with = "lenient")]
    pub display_name: Option<String>,
    /// Server-side session ID
    #[serde(default, deserialize_with = "lenient")]
    pub session_id: Option<String>,
    /// Roles granted to the user
    #[serde(default, deserialize_with = "lenient")]
    pub roles: Vec<String>,
    /// Issued at (seconds since epoch)
    #[serde(default, deserialize_with = "lenient")]
    pub iat: Option<f64>,
    /// Expiration (seconds since epoch)
    #[serde(default, deserialize_with = "lenient")]
    pub exp: Option<f64>,
}

impl TokenClaims {
    /// Check if the claims are expired at `now`.
    ///
    /// Claims without an expiry are treated as expired. `exp` is compared in
    /// fractional seconds, so values past chrono's range never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.exp.filter(|exp| exp.is_finite()) {
            Some(exp) => now.timestamp_millis() as f64 / 1000.0 >= exp,
            None => true,
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}
