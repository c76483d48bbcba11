//! Report sink that writes records as structured tracing events.
//!
//! Every field is emitted as a scalar so log pipelines can index records
//! without parsing nested payloads.

use async_trait::async_trait;

use crate::application::dto::{CycleRecord, OutcomeRecord};
use crate::application::ports::{ReportError, ReportSinkPort};

/// Tracing target for report events.
pub const REPORT_TARGET: &str = "admission_engine::report";

/// Emits outcome and cycle records on the `admission_engine::report` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReportSink;

impl TracingReportSink {
    /// Create a new sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportSinkPort for TracingReportSink {
    async fn emit_outcome(&self, record: &OutcomeRecord) -> Result<(), ReportError> {
        tracing::info!(
            target: REPORT_TARGET,
            cycle_id = %record.cycle_id,
            candidate_id = %record.candidate_id,
            symbol = %record.symbol,
            rank = record.rank,
            outcome = %record.outcome,
            reason_code = %record.reason_code,
            reason = %record.reason,
            required_capacity = %record.required_capacity,
            consumed_capacity = %record.consumed_capacity,
            checked_capacity = record.checked_capacity.map(|c| c.to_string()),
            client_order_id = record.client_order_id.as_deref(),
            broker_order_id = record.broker_order_id.as_deref(),
            recorded_at = %record.recorded_at,
            "candidate outcome"
        );
        Ok(())
    }

    async fn emit_summary(&self, record: &CycleRecord) -> Result<(), ReportError> {
        tracing::info!(
            target: REPORT_TARGET,
            cycle_id = %record.cycle_id,
            status = %record.status,
            status_message = record.status_message.as_deref(),
            degraded = record.degraded,
            candidates = record.candidates,
            committed = record.committed,
            skipped_insufficient_capacity = record.skipped_insufficient_capacity,
            late_capacity_races = record.late_capacity_races,
            failed_external = record.failed_external,
            failed_validation = record.failed_validation,
            not_attempted = record.not_attempted,
            total_consumed = %record.total_consumed,
            initial_capacity = record.initial_capacity.map(|c| c.to_string()),
            final_capacity = record.final_capacity.map(|c| c.to_string()),
            committed_symbols = %record.committed_symbols,
            started_at = %record.started_at,
            finished_at = %record.finished_at,
            duration_ms = record.duration_ms,
            "cycle summary"
        );
        Ok(())
    }
}
