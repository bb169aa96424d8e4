//! Layered configuration loading.
//!
//! [`ConfigLoader`] applies defaults, then a file (TOML or JSON), then
//! `PREFIX__SECTION__KEY` environment variables, and validates the result.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::{CerberusConfig, ConfigError, LogFormat};

/// Configuration loader.
///
/// Later layers override earlier ones:
/// 1. Defaults (or a preset)
/// 2. Configuration file
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use cerberus_config::ConfigLoader;
///
/// # fn main() -> Result<(), cerberus_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_optional_file("cerberus.toml")?
///     .with_env_prefix("CERBERUS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: CerberusConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CerberusConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = CerberusConfig::default();
        self
    }

    /// Starts from the development preset.
    ///
    /// ```
    /// use cerberus_config::{ConfigLoader, LogFormat};
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = CerberusConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = CerberusConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file. Sections it omits fall back to
    /// defaults, not to earlier layers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, has an
    /// unsupported extension, fails to parse or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `format` ("toml" or "json").
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unsupported or parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use cerberus_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [auth]
    ///     login_path = "/signin"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.auth.login_path, "/signin");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Enables environment overrides of the form `PREFIX__SECTION__KEY`,
    /// e.g. `CERBERUS__AUTH__LOGIN_PATH=/signin`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads a `.env` file into the process environment if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::validation_error(format!(
                "failed to load .env file: {e}"
            ))),
        }
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(mut self) -> Result<CerberusConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or
    /// validation.
    #[must_use]
    pub fn load_unvalidated(self) -> CerberusConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<CerberusConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let env_vars: HashMap<String, String> =
            env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        match parts.as_slice() {
            ["AUTH", "LOGIN_PATH"] => self.config.auth.login_path = value.to_string(),
            ["AUTH", "JSON_MEDIA_TYPES"] => {
                self.config.auth.json_media_types = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            ["AUTH", "API_KEY_HEADER"] => self.config.auth.api_key_header = value.to_lowercase(),
            ["AUTH", "API_KEY_QUERY_PARAM"] => self.config.auth.api_key_query_param = value.to_string(),
            ["AUTH", "SESSION_USER_KEY"] => self.config.auth.session_user_key = value.to_string(),
            ["AUTH", "ROLE_BASE_STRATEGY"] => self.config.auth.role_base_strategy = value.to_string(),
            ["AUTH", "PERMISSION_BASE_STRATEGY"] => {
                self.config.auth.permission_base_strategy = value.to_string();
            }
            ["AUTH", "SECURITY_HEADERS", name] => {
                let name = name.replace('_', "-").to_lowercase();
                if value.is_empty() {
                    self.config.auth.security_headers.shift_remove(&name);
                } else {
                    self.config.auth.security_headers.insert(name, value.to_string());
                }
            }

            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                self.config.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            ["METRICS", "ENABLED"] => {
                self.config.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["METRICS", "LISTEN_ADDR"] => {
                self.config.metrics.listen_addr = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }

            _ => {}
        }

        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, CerberusConfig::default());
    }

    #[test]
    fn test_loader_presets() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.level, "debug");

        let config = ConfigLoader::new().with_production().load().unwrap();
        assert!(config.metrics.enabled);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"auth": {"api_key_header": "x-token"}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.auth.api_key_header, "x-token");
        assert_eq!(config.auth.login_path, "/login");
    }

    #[test]
    fn test_loader_unsupported_format() {
        assert!(ConfigLoader::new().with_string("", "yaml").is_err());
    }

    #[test]
    fn test_loader_with_string_then_invalid_value() {
        let toml = r#"
            [auth]
            login_path = "signin"
        "#;
        let result = ConfigLoader::new().with_string(toml, "toml").unwrap().load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_loader_with_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [auth]
            login_path = "/account/login"
            json_media_types = ["application/json", "application/vnd.api+json"]

            [auth.security_headers]
            x-frame-options = "SAMEORIGIN"

            [logging]
            level = "warn"
            format = "pretty"

            [metrics]
            enabled = true
            listen_addr = "127.0.0.1:9100"
            "#
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.auth.login_path, "/account/login");
        assert_eq!(config.auth.json_media_types.len(), 2);
        assert_eq!(config.auth.security_headers.len(), 1);
        assert_eq!(config.auth.security_headers["x-frame-options"], "SAMEORIGIN");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.metrics.listen_addr.as_deref(), Some("127.0.0.1:9100"));
    }

    #[test]
    fn test_loader_with_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"auth": {{"session_user_key": "uid"}}}}"#).unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.auth.session_user_key, "uid");
    }

    #[test]
    fn test_loader_unknown_field_in_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[auth]\nlogin_url = \"/x\"").unwrap();

        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_loader_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(ConfigLoader::new().with_file(file.path()).is_err());
    }

    #[test]
    fn test_loader_missing_files() {
        let result = ConfigLoader::new().with_file("/nonexistent/cerberus.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));

        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/cerberus.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, CerberusConfig::default());
    }

    #[test]
    fn test_load_unvalidated_skips_validation() {
        let toml = r#"
            [auth]
            login_path = "no-slash"
        "#;
        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.auth.login_path, "no-slash");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        for s in ["true", "TRUE", "1", "yes", "on"] {
            assert_eq!(parse_bool(s), Some(true));
        }
        for s in ["false", "False", "0", "no", "off"] {
            assert_eq!(parse_bool(s), Some(false));
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    // Overrides go through apply_env_var directly; mutating the process
    // environment would need unsafe and races other tests.

    #[test]
    fn test_apply_env_var_auth() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__AUTH__LOGIN_PATH", "/signin", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__AUTH__API_KEY_HEADER", "X-Token", "TEST")
            .unwrap();
        loader
            .apply_env_var(
                "TEST__AUTH__JSON_MEDIA_TYPES",
                "application/json, application/hal+json,",
                "TEST",
            )
            .unwrap();
        loader
            .apply_env_var("TEST__AUTH__ROLE_BASE_STRATEGY", "api_key", "TEST")
            .unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.auth.login_path, "/signin");
        assert_eq!(config.auth.api_key_header, "x-token");
        assert_eq!(
            config.auth.json_media_types,
            vec!["application/json", "application/hal+json"]
        );
        assert_eq!(config.auth.role_base_strategy, "api_key");
    }

    #[test]
    fn test_apply_env_var_security_headers() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var(
                "TEST__AUTH__SECURITY_HEADERS__STRICT_TRANSPORT_SECURITY",
                "max-age=63072000",
                "TEST",
            )
            .unwrap();
        loader
            .apply_env_var("TEST__AUTH__SECURITY_HEADERS__X_FRAME_OPTIONS", "", "TEST")
            .unwrap();

        let headers = &loader.config.auth.security_headers;
        assert_eq!(headers["strict-transport-security"], "max-age=63072000");
        assert!(!headers.contains_key("x-frame-options"));
    }

    #[test]
    fn test_apply_env_var_logging_and_metrics() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__LOGGING__LEVEL", "debug", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__FORMAT", "PRETTY", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__INCLUDE_LOCATION", "yes", "TEST").unwrap();
        loader.apply_env_var("TEST__METRICS__ENABLED", "on", "TEST").unwrap();
        loader
            .apply_env_var("TEST__METRICS__LISTEN_ADDR", "0.0.0.0:9090", "TEST")
            .unwrap();

        let config = &loader.config;
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.logging.include_location);
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.listen_addr.as_deref(), Some("0.0.0.0:9090"));

        loader.apply_env_var("TEST__METRICS__LISTEN_ADDR", "", "TEST").unwrap();
        assert!(loader.config.metrics.listen_addr.is_none());
    }

    #[test]
    fn test_apply_env_var_parse_errors() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("TEST__LOGGING__ENABLED", "maybe", "TEST").is_err());
        assert!(loader.apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST").is_err());
        assert!(loader.apply_env_var("OTHER__AUTH__LOGIN_PATH", "/x", "TEST").is_err());
    }

    #[test]
    fn test_apply_env_var_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__AUTH__NOPE", "x", "TEST").unwrap();
        assert_eq!(loader.config, CerberusConfig::default());
    }
}
