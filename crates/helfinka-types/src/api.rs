//! API request/response types

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{EntryData, EntryType, User, ValidationError};

/// Minimum length for a new password
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Loose `local@domain.tld` check, matching what the service accepts
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// `GET /hello` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloResponse {
    pub message: String,
}

/// `GET /version` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVersionInfo {
    pub version: String,
    pub environment: String,
    pub built: String,
}

/// Response of the list endpoints.
///
/// Items stay untyped so a single malformed item cannot fail the whole
/// response; they go through [`crate::decode_batch`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntriesResponse {
    #[serde(default)]
    pub items: Vec<Value>,
}

/// `POST /entries` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateEntryRequest {
    /// ISO-8601 UTC instant of the observation
    pub timestamp: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Validated payload
    pub data: EntryData,
}

/// `DELETE /entries` query parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteEntryQuery {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

/// `PATCH /users/{id}` body for profile changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ProfileUpdate {
    /// Build an update holding only the fields that differ from `current`.
    ///
    /// The display name is trimmed before comparing. Returns `None` when
    /// there is nothing to send.
    pub fn diff(current: &User, email: &str, display_name: &str) -> Option<Self> {
        let display_name = display_name.trim();
        let update = Self {
            email: (email != current.email).then(|| email.to_string()),
            display_name: (display_name != current.display_name).then(|| display_name.to_string()),
        };

        if update.email.is_none() && update.display_name.is_none() {
            None
        } else {
            Some(update)
        }
    }

    /// At least one field, a well-formed email and a non-blank name
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.email.is_none() && self.display_name.is_none() {
            return Err(ValidationError::new(
                "profile",
                "at least one of email or displayName must be provided",
            ));
        }
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                return Err(ValidationError::new("email", "must be a valid email address"));
            }
        }
        if let Some(name) = &self.display_name {
            if name.trim().is_empty() {
                return Err(ValidationError::new("displayName", "must not be empty"));
            }
        }
        Ok(self)
    }
}

/// `PATCH /users/{id}` body for password changes
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub old_password: String,
    pub password: String,
}

impl PasswordChange {
    pub fn new(old_password: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            old_password: old_password.into(),
            password: password.into(),
        }
    }

    /// Build a change from a form with a confirmation field, applying the
    /// minimum length and match rules
    pub fn with_confirmation(
        old_password: impl Into<String>,
        password: impl Into<String>,
        confirmation: &str,
    ) -> Result<Self, ValidationError> {
        let change = Self::new(old_password, password);
        if change.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        if change.password != confirmation {
            return Err(ValidationError::new("confirmPassword", "passwords do not match"));
        }
        change.validate()
    }

    /// Both passwords must be present
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.old_password.is_empty() {
            return Err(ValidationError::new("oldPassword", "must not be empty"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::new("password", "must not be empty"));
        }
        Ok(self)
    }
}

impl std::fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordChange").finish_non_exhaustive()
    }
}

/// `PATCH /users/{id}` response for profile changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: User,
}
