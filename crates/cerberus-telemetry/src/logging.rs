//! Structured logging for Cerberus.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and either
//! JSON (production) or pretty (development) formatting.
//!
//! # Example
//!
//! ```rust,ignore
//! use cerberus_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! tracing::info!(strategy = "session", "authenticated");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g. "info", "cerberus_auth=debug,warn").
    pub level: String,

    /// Whether to output JSON.
    pub json_format: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include the target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Human-readable output at debug level.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            file_line_info: true,
            include_target: true,
        }
    }

    /// JSON output at info level.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

/// Initializes the global logging subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the filter is invalid or a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns an error if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("invalid log level: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert!(config.json_format);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert!(!config.json_format);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("cerberus_auth=debug,warn").is_ok());
    }

    #[test]
    fn test_disabled_logging_is_noop() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
