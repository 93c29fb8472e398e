//! Persisted session record

use std::sync::Arc;

use helfinka_types::User;
use serde::{Deserialize, Serialize};

use crate::KeyValueStore;

/// Storage key of the session record
pub const AUTH_STORAGE_KEY: &str = "helfinka_auth";

/// Token and profile persisted between runs
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub user: User,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user.id)
            .finish()
    }
}

/// Reads and writes the session record.
///
/// Storage and serialization failures are logged and swallowed: a record
/// that cannot be read is the same as no record.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub fn save(&self, session: &StoredSession) {
        let raw = match serde_json::to_string(session) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize session");
                return;
            }
        };
        if let Err(e) = self.storage.set(AUTH_STORAGE_KEY, &raw) {
            tracing::warn!(error = %e, "Failed to persist session");
        }
    }

    /// The persisted record, if present and complete
    pub fn load(&self) -> Option<StoredSession> {
        let raw = match self.storage.get(AUTH_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session");
                return None;
            }
        };

        let session: StoredSession = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed session record");
                return None;
            }
        };

        if session.token.is_empty() || session.user.id.as_str().is_empty() {
            tracing::debug!("Ignoring incomplete session record");
            return None;
        }
        Some(session)
    }

    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(AUTH_STORAGE_KEY) {
            tracing::warn!(error = %e, "Failed to clear session");
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
