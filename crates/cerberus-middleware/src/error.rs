//! Error types for building middleware.

use thiserror::Error;

/// Result type for middleware construction.
pub type MiddlewareResult<T> = Result<T, MiddlewareError>;

/// Errors raised while configuring middleware. Request handling itself
/// never fails with these; it always produces a response.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MiddlewareError {
    /// A header name is not a valid HTTP header name.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    /// A header value is not a valid HTTP header value.
    #[error("invalid value for header {name}")]
    InvalidHeaderValue {
        /// The header whose value was rejected.
        name: String,
    },

    /// The login path cannot be used as a redirect target.
    #[error("invalid login path: {0}")]
    InvalidLoginPath(String),
}
