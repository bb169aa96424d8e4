//! Errors raised while assembling an authentication stack.

use cerberus_auth::AuthError;
use cerberus_config::ConfigError;
use cerberus_middleware::MiddlewareError;
use cerberus_telemetry::TelemetryError;
use thiserror::Error;

/// Startup errors from any Cerberus crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CerberusError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Strategy registration failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A response setting could not be turned into HTTP values.
    #[error(transparent)]
    Middleware(#[from] MiddlewareError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Result alias for stack assembly.
pub type CerberusResult<T> = Result<T, CerberusError>;
