//! Configuration schema types.
//!
//! This module defines the structure of every configuration section.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Authentication section.
///
/// # Example
///
/// ```
/// use cerberus_config::AuthConfig;
///
/// let config = AuthConfig::default();
/// assert_eq!(config.login_path, "/login");
/// assert_eq!(config.api_key_header, "x-api-key");
/// assert_eq!(config.security_headers["x-frame-options"], "DENY");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Where unauthenticated HTML clients are redirected.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Media types that select JSON failure bodies. Any `+json` type is
    /// recognized in addition to these.
    #[serde(default = "default_json_media_types")]
    pub json_media_types: Vec<String>,

    /// Headers added to every response.
    #[serde(default = "default_security_headers")]
    pub security_headers: IndexMap<String, String>,

    /// Header carrying an API key.
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Query parameter carrying an API key when the header is absent.
    #[serde(default = "default_api_key_query_param")]
    pub api_key_query_param: String,

    /// Session key holding the authenticated user's id.
    #[serde(default = "default_session_user_key")]
    pub session_user_key: String,

    /// Strategy that `role:` requirements authenticate through.
    #[serde(default = "default_base_strategy")]
    pub role_base_strategy: String,

    /// Strategy that `permission:` requirements authenticate through.
    #[serde(default = "default_base_strategy")]
    pub permission_base_strategy: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            json_media_types: default_json_media_types(),
            security_headers: default_security_headers(),
            api_key_header: default_api_key_header(),
            api_key_query_param: default_api_key_query_param(),
            session_user_key: default_session_user_key(),
            role_base_strategy: default_base_strategy(),
            permission_base_strategy: default_base_strategy(),
        }
    }
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_json_media_types() -> Vec<String> {
    vec!["application/json".to_string()]
}

fn default_security_headers() -> IndexMap<String, String> {
    [
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("referrer-policy", "strict-origin-when-cross-origin"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

fn default_api_key_header() -> String {
    "x-api-key".to_string()
}

fn default_api_key_query_param() -> String {
    "api_key".to_string()
}

fn default_session_user_key() -> String {
    "user_id".to_string()
}

fn default_base_strategy() -> String {
    "session".to_string()
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g. "info" or "cerberus_auth=debug,warn").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Record authentication metrics.
    #[serde(default)]
    pub enabled: bool,

    /// Serve Prometheus metrics on this address (e.g. "0.0.0.0:9090").
    #[serde(default)]
    pub listen_addr: Option<String>,
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.json_media_types, vec!["application/json"]);
        assert_eq!(config.api_key_query_param, "api_key");
        assert_eq!(config.session_user_key, "user_id");
        assert_eq!(config.role_base_strategy, "session");
        assert_eq!(config.security_headers.len(), 3);
    }

    #[test]
    fn test_partial_auth_section_keeps_defaults() {
        let config: AuthConfig = toml::from_str(r#"login_path = "/signin""#).unwrap();
        assert_eq!(config.login_path, "/signin");
        assert_eq!(config.api_key_header, "x-api-key");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<AuthConfig, _> = toml::from_str(r#"login_url = "/signin""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_serde() {
        let config: LoggingConfig = toml::from_str(r#"format = "pretty""#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.enabled);
    }

    #[test]
    fn test_metrics_default_disabled() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert!(config.listen_addr.is_none());
    }
}
