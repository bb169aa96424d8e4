//! Authentication metrics.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `cerberus_auth_attempts_total` | Counter | `strategy`, `outcome` | Strategy invocations |
//! | `cerberus_auth_attempt_duration_seconds` | Histogram | `strategy` | Strategy latency |
//! | `cerberus_auth_decisions_total` | Counter | `decision` | Final per-request decisions |
//! | `cerberus_strategy_cache_lookups_total` | Counter | `result` | Resolver cache hits/misses |
//!
//! The recording functions are safe to call before [`init_metrics`]; the
//! `metrics` facade drops observations when no recorder is installed.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, Default)]
pub struct MetricsConfig {
    /// Whether metrics are recorded.
    pub enabled: bool,

    /// Address for the built-in Prometheus listener. When `None` the host
    /// exposes [`render_metrics`] itself.
    pub listen_addr: Option<String>,
}

/// Installs the Prometheus recorder.
///
/// With a listen address the exporter serves `/metrics` itself, which
/// requires a running Tokio runtime.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    match &config.listen_addr {
        Some(addr) => {
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| TelemetryError::InvalidAddress(format!("{addr}: {e}")))?;
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        }
        None => {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            let _ = METRICS_HANDLE.set(handle);
        }
    }

    register_metric_descriptions();
    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` unless [`init_metrics`] installed a recorder without a
/// listen address.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(
        "cerberus_auth_attempts_total",
        "Authentication strategy invocations by outcome"
    );
    describe_histogram!(
        "cerberus_auth_attempt_duration_seconds",
        "Authentication strategy latency in seconds"
    );
    describe_counter!(
        "cerberus_auth_decisions_total",
        "Final authentication/authorization decisions"
    );
    describe_counter!(
        "cerberus_strategy_cache_lookups_total",
        "Strategy resolver cache lookups by result"
    );
}

/// Records one strategy invocation.
///
/// `outcome` is `"success"` or `"failure"`.
pub fn record_strategy_attempt(strategy: &str, outcome: &str, duration: Duration) {
    counter!(
        "cerberus_auth_attempts_total",
        "strategy" => strategy.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "cerberus_auth_attempt_duration_seconds",
        "strategy" => strategy.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records the final decision for a request
/// (`authorized`, `unauthorized`, `forbidden`, `misconfigured`).
pub fn record_decision(decision: &str) {
    counter!(
        "cerberus_auth_decisions_total",
        "decision" => decision.to_string()
    )
    .increment(1);
}

/// Records a strategy resolver cache lookup.
pub fn record_cache_lookup(hit: bool) {
    counter!(
        "cerberus_strategy_cache_lookups_total",
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}
