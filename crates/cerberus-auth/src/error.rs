//! Error types for the authentication crate.
//!
//! These cover building the strategy registry and strategies. Outcomes of
//! authenticating a request are values ([`AuthResult`](cerberus_core::AuthResult),
//! [`AuthDecision`](crate::AuthDecision)) and never appear here.

use thiserror::Error;

/// Result type for registry and strategy construction.
pub type RegistryResult<T> = Result<T, AuthError>;

/// Errors that can occur while assembling authentication.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// A strategy was registered twice under the same name.
    #[error("strategy already registered: {0}")]
    DuplicateStrategy(String),

    /// A strategy was registered under an empty name.
    #[error("strategy name must not be empty")]
    EmptyStrategyName,

    /// A strategy referenced another strategy that is not registered.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Invalid strategy configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
