//! Typed configuration for Cerberus.
//!
//! - TOML and JSON files
//! - Environment variable overrides (`CERBERUS__AUTH__LOGIN_PATH=/signin`)
//! - Strict parsing: unknown fields are errors
//! - Validation of header names, paths and log filters before anything
//!   is built from the values
//!
//! # Example
//!
//! ```no_run
//! use cerberus_config::ConfigLoader;
//!
//! # fn main() -> Result<(), cerberus_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("cerberus.toml")?
//!     .with_env_prefix("CERBERUS")
//!     .load()?;
//!
//! println!("login redirect: {}", config.auth.login_path);
//! # Ok(())
//! # }
//! ```
//!
//! # File Format
//!
//! ```toml
//! [auth]
//! login_path = "/login"
//! json_media_types = ["application/json"]
//! api_key_header = "x-api-key"
//! api_key_query_param = "api_key"
//! session_user_key = "user_id"
//! role_base_strategy = "session"
//! permission_base_strategy = "session"
//!
//! [auth.security_headers]
//! x-content-type-options = "nosniff"
//! x-frame-options = "DENY"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! listen_addr = "0.0.0.0:9090"
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::CerberusConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AuthConfig, LogFormat, LoggingConfig, MetricsConfig};
