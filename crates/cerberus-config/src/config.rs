//! Root configuration type.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::{AuthConfig, ConfigError, LogFormat, LoggingConfig, MetricsConfig};

/// Complete Cerberus configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use cerberus_config::CerberusConfig;
///
/// let config = CerberusConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.auth.login_path, "/login");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct CerberusConfig {
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl CerberusConfig {
    /// Development preset: pretty debug logs, metrics off.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingConfig {
                enabled: true,
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: true,
            },
            ..Self::default()
        }
    }

    /// Production preset: JSON logs at info, metrics recorded.
    #[must_use]
    pub fn production() -> Self {
        Self {
            metrics: MetricsConfig {
                enabled: true,
                listen_addr: None,
            },
            ..Self::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_auth()?;

        cerberus_telemetry::logging::create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        if self.metrics.enabled {
            if let Some(addr) = &self.metrics.listen_addr {
                if addr.parse::<SocketAddr>().is_err() {
                    return Err(ConfigError::invalid_value(
                        "metrics.listen_addr",
                        format!("invalid socket address: {addr}"),
                    ));
                }
            }
        }

        Ok(())
    }

    fn validate_auth(&self) -> Result<(), ConfigError> {
        let auth = &self.auth;

        if !auth.login_path.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "auth.login_path",
                "must start with '/'",
            ));
        }
        if http::HeaderValue::from_str(&auth.login_path).is_err() {
            return Err(ConfigError::invalid_value(
                "auth.login_path",
                "must be a valid header value",
            ));
        }

        for media in &auth.json_media_types {
            if !media.contains('/') {
                return Err(ConfigError::invalid_value(
                    "auth.json_media_types",
                    format!("not a media type: {media}"),
                ));
            }
        }

        for (name, value) in &auth.security_headers {
            if http::HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(ConfigError::invalid_value(
                    "auth.security_headers",
                    format!("invalid header name: {name}"),
                ));
            }
            if http::HeaderValue::from_str(value).is_err() {
                return Err(ConfigError::invalid_value(
                    "auth.security_headers",
                    format!("invalid value for header {name}"),
                ));
            }
        }

        if http::HeaderName::from_bytes(auth.api_key_header.as_bytes()).is_err() {
            return Err(ConfigError::invalid_value(
                "auth.api_key_header",
                format!("invalid header name: {}", auth.api_key_header),
            ));
        }

        for (field, value) in [
            ("auth.api_key_query_param", &auth.api_key_query_param),
            ("auth.session_user_key", &auth.session_user_key),
            ("auth.role_base_strategy", &auth.role_base_strategy),
            ("auth.permission_base_strategy", &auth.permission_base_strategy),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid_value(field, "must not be empty"));
            }
        }

        Ok(())
    }

    /// Logging settings in the form the telemetry crate installs.
    #[must_use]
    pub fn log_config(&self) -> cerberus_telemetry::LogConfig {
        cerberus_telemetry::LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            json_format: self.logging.format == LogFormat::Json,
            file_line_info: self.logging.include_location,
            include_target: true,
        }
    }

    /// Metrics settings in the form the telemetry crate installs.
    #[must_use]
    pub fn metrics_config(&self) -> cerberus_telemetry::MetricsConfig {
        cerberus_telemetry::MetricsConfig {
            enabled: self.metrics.enabled,
            listen_addr: self.metrics.listen_addr.clone(),
        }
    }
}
