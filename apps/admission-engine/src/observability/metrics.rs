//! Prometheus metrics for the admission engine.
//!
//! Recording functions are no-ops until a recorder is installed, so the
//! controller records unconditionally.
//!
//! # Example
//!
//! ```ignore
//! use admission_engine::observability::{init_metrics, MetricsConfig};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config)?;
//!
//! record_outcome("COMMITTED");
//! ```

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::net::{Ipv4Addr, SocketAddr};

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for broker round trips (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
            // Broker round trips, 5ms to 10s
            latency_buckets: vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}

// ============================================================================
// Admission Metrics
// ============================================================================

/// Record one candidate outcome.
///
/// # Arguments
///
/// * `kind` - Outcome kind (e.g., "COMMITTED", "FAILED_EXTERNAL")
pub fn record_outcome(kind: &str) {
    counter!("admission_outcomes_total", "kind" => kind.to_string()).increment(1);
}

/// Record capacity consumed by a commit.
pub fn record_capacity_consumed(amount: Decimal) {
    counter!("admission_capacity_consumed_total").increment(amount.trunc().to_u64().unwrap_or(0));
}

/// Record a capacity oracle round trip and the capacity it reported.
///
/// `available` is `None` when the fetch failed.
pub fn record_oracle_fetch(latency_seconds: f64, available: Option<Decimal>) {
    histogram!("admission_oracle_latency_seconds").record(latency_seconds);
    if let Some(available) = available {
        gauge!("admission_available_capacity").set(to_f64(available));
    }
}

/// Record an order submission round trip.
///
/// # Arguments
///
/// * `result` - Classified result (e.g., "accepted", "rejected_for_capacity", "error")
/// * `latency_seconds` - Time from submit to answer in seconds
pub fn record_submission(result: &str, latency_seconds: f64) {
    histogram!(
        "admission_submission_latency_seconds",
        "result" => result.to_string()
    )
    .record(latency_seconds);
}

/// Record a capacity race the broker detected after the pre-check passed.
pub fn record_late_capacity_race() {
    counter!("admission_late_capacity_races_total").increment(1);
}

/// Record a finished cycle.
///
/// # Arguments
///
/// * `status` - Cycle status (e.g., "COMPLETED", "ORACLE_UNAVAILABLE")
pub fn record_cycle(status: &str) {
    counter!("admission_cycles_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert_eq!(config.listen_addr.port(), 9090);
        assert!(!config.latency_buckets.is_empty());
    }

    #[test]
    fn test_config_with_addr() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let config = MetricsConfig::with_addr(addr);
        assert_eq!(config.listen_addr.port(), 8080);
    }

    #[test]
    fn test_latency_buckets_sorted() {
        let config = MetricsConfig::default();
        assert!(config.latency_buckets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_recording_without_recorder() {
        // Without an installed recorder every call is a no-op
        record_outcome("COMMITTED");
        record_capacity_consumed(dec!(25000.50));
        record_oracle_fetch(0.042, Some(dec!(50000)));
        record_oracle_fetch(0.5, None);
        record_submission("accepted", 0.120);
        record_late_capacity_race();
        record_cycle("COMPLETED");
    }
}
