//! Observability for Cerberus.
//!
//! - **Logging**: structured logs through `tracing-subscriber`
//! - **Metrics**: authentication counters and latencies through the
//!   `metrics` facade, optionally exported in Prometheus format
//!
//! # Example
//!
//! ```rust,ignore
//! use cerberus_telemetry::{init_telemetry, LogConfig, MetricsConfig};
//!
//! init_telemetry(&LogConfig::production(), &MetricsConfig::default())?;
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use crate::error::TelemetryError;
pub use crate::logging::{init_logging, LogConfig};
pub use crate::metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns the first subsystem error encountered.
pub fn init_telemetry(logging: &LogConfig, metrics: &MetricsConfig) -> TelemetryResult<()> {
    init_logging(logging)?;
    init_metrics(metrics)?;
    Ok(())
}
