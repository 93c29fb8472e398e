//! User types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unique user identifier, opaque to the client
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// User profile as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Email address
    pub email: String,
    /// Name shown in the UI
    pub display_name: String,
    /// Any other profile fields, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Create a user with no extra profile fields
    pub fn new(id: impl Into<String>, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id.into()),
            email: email.into(),
            display_name: display_name.into(),
            extra: Map::new(),
        }
    }

    /// Initial used for the avatar badge
    pub fn initial(&self) -> Option<char> {
        self.display_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
    }
}
