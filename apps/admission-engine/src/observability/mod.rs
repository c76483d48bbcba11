//! Observability module for metrics.
//!
//! This module provides Prometheus instrumentation for the admission loop.

mod metrics;

pub use self::metrics::{
    MetricsConfig, MetricsError, init_metrics, record_capacity_consumed, record_cycle,
    record_late_capacity_race, record_oracle_fetch, record_outcome, record_submission,
};
