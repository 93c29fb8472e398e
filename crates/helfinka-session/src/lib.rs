//! Helfinka Session - client-local state
//!
//! Everything the client keeps between runs:
//! - the login session and its lifecycle ([`SessionManager`])
//! - note tag history used for suggestions
//! - the colour theme preference
//!
//! All of it sits on a pluggable [`KeyValueStore`].

pub mod error;
pub mod manager;
pub mod storage;
pub mod store;
pub mod tags;
pub mod theme;
pub mod token;

pub use error::{SessionError, StorageError};
pub use manager::{AuthBackend, SessionManager, SessionStatus};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{SessionStore, StoredSession, AUTH_STORAGE_KEY};
pub use tags::{NoteTagHistory, NOTE_TAGS_STORAGE_KEY, SEEDED_TAGS};
pub use theme::{Theme, ThemePreference, THEME_STORAGE_KEY};
pub use token::{decode_token_claims, is_token_expired};
