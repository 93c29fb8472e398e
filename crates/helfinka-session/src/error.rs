//! Session errors

use helfinka_client::ClientError;
use helfinka_types::ValidationError;
use thiserror::Error;

/// Session operation errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// The API call failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Input was rejected before any request was sent
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The operation needs a logged-in user
    #[error("not authenticated")]
    NotAuthenticated,
}

impl SessionError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(e) => e.user_message(),
            Self::Validation(e) => e.to_string(),
            Self::NotAuthenticated => "Please log in first.".to_string(),
        }
    }
}

/// Key-value storage errors.
///
/// Never escape [`crate::SessionStore`]; they are logged and the operation
/// degrades to "nothing stored".
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key contains characters that cannot be used as a file name
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}
