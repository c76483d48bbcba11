//! Reporting records
//!
//! Flat, scalar-typed projections of outcomes and cycle summaries for the
//! reporting sink.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::admission::{CapacitySnapshot, CycleStatus, CycleSummary, ExecutionOutcome, OutcomeKind};
use crate::domain::shared::CycleId;

/// One outcome, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Cycle ID.
    pub cycle_id: String,
    /// Candidate ID.
    pub candidate_id: String,
    /// Symbol.
    pub symbol: String,
    /// Position in the batch.
    pub rank: u32,
    /// Outcome kind (e.g. `COMMITTED`).
    pub outcome: String,
    /// Reason code (e.g. `LATE_CAPACITY_RACE`).
    pub reason_code: String,
    /// Human-readable reason.
    pub reason: String,
    /// Capacity the candidate required.
    pub required_capacity: Decimal,
    /// Capacity consumed.
    pub consumed_capacity: Decimal,
    /// Available capacity at the admission check.
    pub checked_capacity: Option<Decimal>,
    /// Client order ID, if submitted.
    pub client_order_id: Option<String>,
    /// Broker order ID, if accepted.
    pub broker_order_id: Option<String>,
    /// Recorded at (RFC 3339).
    pub recorded_at: String,
}

impl OutcomeRecord {
    /// Project an outcome.
    #[must_use]
    pub fn from_outcome(cycle_id: &CycleId, outcome: &ExecutionOutcome) -> Self {
        Self {
            cycle_id: cycle_id.to_string(),
            candidate_id: outcome.candidate_id().to_string(),
            symbol: outcome.symbol().to_string(),
            rank: outcome.rank(),
            outcome: outcome.kind().as_str().to_string(),
            reason_code: outcome.reason().code().to_string(),
            reason: outcome.reason().to_string(),
            required_capacity: outcome.required_capacity().amount(),
            consumed_capacity: outcome.consumed().amount(),
            checked_capacity: outcome.checked_capacity().map(|m| m.amount()),
            client_order_id: outcome.client_order_id().map(ToString::to_string),
            broker_order_id: outcome.broker_order_id().map(ToString::to_string),
            recorded_at: outcome.recorded_at().to_rfc3339(),
        }
    }
}

/// One cycle, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    /// Cycle ID.
    pub cycle_id: String,
    /// Cycle status (e.g. `COMPLETED`).
    pub status: String,
    /// Oracle error when the cycle was cut short.
    pub status_message: Option<String>,
    /// True if the oracle failure cut the cycle short.
    pub degraded: bool,
    /// Candidates in the batch.
    pub candidates: usize,
    /// Committed count.
    pub committed: usize,
    /// Skipped for insufficient capacity (including late races).
    pub skipped_insufficient_capacity: usize,
    /// Late-detected capacity races.
    pub late_capacity_races: usize,
    /// Rejected or failed submissions.
    pub failed_external: usize,
    /// Never submitted: invalid, duplicate, or capacity unknown.
    pub failed_validation: usize,
    /// Not reached before cancellation.
    pub not_attempted: usize,
    /// Total capacity consumed by commits.
    pub total_consumed: Decimal,
    /// Capacity at the first snapshot.
    pub initial_capacity: Option<Decimal>,
    /// Capacity at the last snapshot.
    pub final_capacity: Option<Decimal>,
    /// Committed symbols in batch order, comma separated.
    pub committed_symbols: String,
    /// Started at (RFC 3339).
    pub started_at: String,
    /// Finished at (RFC 3339).
    pub finished_at: String,
    /// Wall time of the cycle.
    pub duration_ms: i64,
}

impl CycleRecord {
    /// Project a summary.
    #[must_use]
    pub fn from_summary(summary: &CycleSummary) -> Self {
        let counts = summary.counts();
        let committed_symbols = summary
            .outcomes_of(OutcomeKind::Committed)
            .map(|o| o.symbol().as_str())
            .collect::<Vec<_>>()
            .join(",");
        let status_message = match summary.status() {
            CycleStatus::OracleUnavailable { message } => Some(message.clone()),
            CycleStatus::Completed | CycleStatus::Cancelled => None,
        };

        Self {
            cycle_id: summary.cycle_id().to_string(),
            status: summary.status().as_str().to_string(),
            status_message,
            degraded: summary.is_degraded(),
            candidates: summary.outcomes().len(),
            committed: counts.committed,
            skipped_insufficient_capacity: counts.skipped_insufficient_capacity,
            late_capacity_races: summary.late_capacity_races(),
            failed_external: counts.failed_external,
            failed_validation: counts.failed_validation,
            not_attempted: counts.not_attempted,
            total_consumed: summary.total_consumed().amount(),
            initial_capacity: summary
                .initial_snapshot()
                .map(|s| CapacitySnapshot::available(s).amount()),
            final_capacity: summary
                .final_snapshot()
                .map(|s| CapacitySnapshot::available(s).amount()),
            committed_symbols,
            started_at: summary.started_at().to_rfc3339(),
            finished_at: summary.finished_at().to_rfc3339(),
            duration_ms: summary
                .finished_at()
                .duration_since(summary.started_at())
                .num_milliseconds(),
        }
    }

    /// Outcome records for every candidate in the summary.
    #[must_use]
    pub fn outcome_records(summary: &CycleSummary) -> Vec<OutcomeRecord> {
        summary
            .outcomes()
            .iter()
            .map(|o| OutcomeRecord::from_outcome(summary.cycle_id(), o))
            .collect()
    }
}
