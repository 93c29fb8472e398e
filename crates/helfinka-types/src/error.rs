//! Common error types

use thiserror::Error;

/// A payload or request failed client-side validation.
///
/// Raised before anything is sent over the wire so the caller can show
/// the problem next to the offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    /// Wire name of the offending field (e.g. `heartRate`)
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn out_of_range(field: &str, min: impl std::fmt::Display, max: impl std::fmt::Display) -> Self {
        Self::new(field, format!("must be between {min} and {max}"))
    }

    pub(crate) fn required(field: &str) -> Self {
        Self::new(field, "must not be empty")
    }

    pub(crate) fn too_long(field: &str, max: usize) -> Self {
        Self::new(field, format!("must be at most {max} characters"))
    }
}
