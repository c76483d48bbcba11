//! Cycle summary aggregate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::{CycleId, DomainError, Money, Timestamp};

use super::outcome::{ExecutionOutcome, OutcomeKind, OutcomeReason};
use super::snapshot::CapacitySnapshot;

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleStatus {
    /// Every candidate was processed.
    Completed,
    /// Cancellation or the deadline stopped the cycle between candidates.
    Cancelled,
    /// The capacity oracle failed; the remainder of the batch was not admitted.
    OracleUnavailable {
        /// Oracle error.
        message: String,
    },
}

impl CycleStatus {
    /// Stable status string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::OracleUnavailable { .. } => "ORACLE_UNAVAILABLE",
        }
    }

    /// Returns true if the cycle did not get to decide every candidate.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::OracleUnavailable { .. })
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Count of outcomes per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    /// Committed candidates.
    pub committed: usize,
    /// Candidates skipped for insufficient capacity (pre-check or late race).
    pub skipped_insufficient_capacity: usize,
    /// Candidates the broker rejected or whose submission failed.
    pub failed_external: usize,
    /// Candidates never submitted because of validation or unknown capacity.
    pub failed_validation: usize,
    /// Candidates not reached before cancellation.
    pub not_attempted: usize,
}

impl OutcomeCounts {
    /// Increment the counter for `kind`.
    pub const fn increment(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Committed => self.committed += 1,
            OutcomeKind::SkippedInsufficientCapacity => self.skipped_insufficient_capacity += 1,
            OutcomeKind::FailedExternal => self.failed_external += 1,
            OutcomeKind::FailedValidation => self.failed_validation += 1,
            OutcomeKind::NotAttempted => self.not_attempted += 1,
        }
    }

    /// Count for `kind`.
    #[must_use]
    pub const fn get(&self, kind: OutcomeKind) -> usize {
        match kind {
            OutcomeKind::Committed => self.committed,
            OutcomeKind::SkippedInsufficientCapacity => self.skipped_insufficient_capacity,
            OutcomeKind::FailedExternal => self.failed_external,
            OutcomeKind::FailedValidation => self.failed_validation,
            OutcomeKind::NotAttempted => self.not_attempted,
        }
    }

    /// Total outcomes counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.committed
            + self.skipped_insufficient_capacity
            + self.failed_external
            + self.failed_validation
            + self.not_attempted
    }
}

/// Everything one admission cycle did, in batch order.
///
/// Built by [`ResultAggregator`](super::ResultAggregator); read-only once
/// finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub(super) cycle_id: CycleId,
    pub(super) status: CycleStatus,
    pub(super) counts: OutcomeCounts,
    pub(super) total_consumed: Money,
    pub(super) initial_snapshot: Option<CapacitySnapshot>,
    pub(super) final_snapshot: Option<CapacitySnapshot>,
    pub(super) outcomes: Vec<ExecutionOutcome>,
    pub(super) started_at: Timestamp,
    pub(super) finished_at: Timestamp,
}

impl CycleSummary {
    /// Cycle id.
    #[must_use]
    pub const fn cycle_id(&self) -> &CycleId {
        &self.cycle_id
    }

    /// How the cycle ended.
    #[must_use]
    pub const fn status(&self) -> &CycleStatus {
        &self.status
    }

    /// Returns true if the oracle failure cut the cycle short.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.status.is_degraded()
    }

    /// Outcome counts per kind.
    #[must_use]
    pub const fn counts(&self) -> OutcomeCounts {
        self.counts
    }

    /// Sum of capacity consumed by committed outcomes.
    #[must_use]
    pub const fn total_consumed(&self) -> Money {
        self.total_consumed
    }

    /// First snapshot taken in the cycle.
    #[must_use]
    pub const fn initial_snapshot(&self) -> Option<&CapacitySnapshot> {
        self.initial_snapshot.as_ref()
    }

    /// Last snapshot taken in the cycle.
    #[must_use]
    pub const fn final_snapshot(&self) -> Option<&CapacitySnapshot> {
        self.final_snapshot.as_ref()
    }

    /// Outcomes in batch order.
    #[must_use]
    pub fn outcomes(&self) -> &[ExecutionOutcome] {
        &self.outcomes
    }

    /// Outcomes of a given kind.
    pub fn outcomes_of(&self, kind: OutcomeKind) -> impl Iterator<Item = &ExecutionOutcome> {
        self.outcomes.iter().filter(move |o| o.kind() == kind)
    }

    /// Number of skips the broker reported after the pre-check passed.
    #[must_use]
    pub fn late_capacity_races(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.reason(), OutcomeReason::LateCapacityRace { .. }))
            .count()
    }

    /// Cycle start.
    #[must_use]
    pub const fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Cycle end.
    #[must_use]
    pub const fn finished_at(&self) -> Timestamp {
        self.finished_at
    }

    /// Verify committed consumption did not exceed the opening capacity.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if it did.
    pub fn check_capacity_invariant(&self) -> Result<(), DomainError> {
        let Some(initial) = self.initial_snapshot else {
            if self.total_consumed.is_zero() {
                return Ok(());
            }
            return Err(DomainError::InvariantViolation {
                aggregate: "CycleSummary".to_string(),
                invariant: "commits require an observed capacity".to_string(),
                state: format!("consumed={} initial=none", self.total_consumed),
            });
        };

        if self.total_consumed > initial.available() {
            return Err(DomainError::InvariantViolation {
                aggregate: "CycleSummary".to_string(),
                invariant: "committed <= initial capacity".to_string(),
                state: format!(
                    "consumed={} initial={}",
                    self.total_consumed,
                    initial.available()
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_increment_and_total() {
        let mut counts = OutcomeCounts::default();
        counts.increment(OutcomeKind::Committed);
        counts.increment(OutcomeKind::Committed);
        counts.increment(OutcomeKind::NotAttempted);

        assert_eq!(counts.get(OutcomeKind::Committed), 2);
        assert_eq!(counts.get(OutcomeKind::NotAttempted), 1);
        assert_eq!(counts.get(OutcomeKind::FailedExternal), 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn status_degraded_only_for_oracle_failure() {
        assert!(!CycleStatus::Completed.is_degraded());
        assert!(!CycleStatus::Cancelled.is_degraded());
        assert!(
            CycleStatus::OracleUnavailable {
                message: "timeout".to_string()
            }
            .is_degraded()
        );
    }

    #[test]
    fn status_serializes_with_tag() {
        let json = serde_json::to_string(&CycleStatus::OracleUnavailable {
            message: "timeout".to_string(),
        })
        .unwrap();
        assert!(json.contains("\"status\":\"ORACLE_UNAVAILABLE\""));
    }
}
