//! Error types for the core crate.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building core values.
///
/// Authentication outcomes are never reported through this type; they are
/// [`AuthResult`](crate::AuthResult) values.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A requirement string was empty or malformed.
    #[error("invalid requirement: {0}")]
    InvalidRequirement(String),

    /// A role name was empty.
    #[error("invalid role: {0:?}")]
    InvalidRole(String),

    /// A session value could not be (de)serialized.
    #[error("session value error: {0}")]
    SessionValue(#[from] serde_json::Error),
}

impl CoreError {
    /// Create an invalid requirement error.
    pub fn invalid_requirement(requirement: impl Into<String>) -> Self {
        Self::InvalidRequirement(requirement.into())
    }
}
