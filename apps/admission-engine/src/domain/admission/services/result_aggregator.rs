//! Result Aggregator
//!
//! Pure bookkeeping: folds outcomes into a [`CycleSummary`] as the cycle
//! progresses. Nothing here influences admission decisions.

use crate::domain::admission::outcome::{ExecutionOutcome, OutcomeKind};
use crate::domain::admission::snapshot::CapacitySnapshot;
use crate::domain::admission::summary::{CycleStatus, CycleSummary, OutcomeCounts};
use crate::domain::shared::{CycleId, DomainError, Money, Timestamp};

/// Accumulates one cycle's outcomes.
#[derive(Debug)]
pub struct ResultAggregator {
    cycle_id: CycleId,
    started_at: Timestamp,
    counts: OutcomeCounts,
    total_consumed: Money,
    initial_snapshot: Option<CapacitySnapshot>,
    last_snapshot: Option<CapacitySnapshot>,
    closing_snapshot: Option<CapacitySnapshot>,
    outcomes: Vec<ExecutionOutcome>,
}

impl ResultAggregator {
    /// Start aggregating a cycle.
    #[must_use]
    pub const fn new(cycle_id: CycleId, started_at: Timestamp) -> Self {
        Self {
            cycle_id,
            started_at,
            counts: OutcomeCounts {
                committed: 0,
                skipped_insufficient_capacity: 0,
                failed_external: 0,
                failed_validation: 0,
                not_attempted: 0,
            },
            total_consumed: Money::ZERO,
            initial_snapshot: None,
            last_snapshot: None,
            closing_snapshot: None,
            outcomes: Vec::new(),
        }
    }

    /// Note a snapshot used for an admission check. The first one becomes the
    /// cycle's initial snapshot.
    pub fn observe_snapshot(&mut self, snapshot: CapacitySnapshot) {
        if self.initial_snapshot.is_none() {
            self.initial_snapshot = Some(snapshot);
        }
        self.last_snapshot = Some(snapshot);
    }

    /// Note the snapshot taken after the last candidate.
    pub fn close_with_snapshot(&mut self, snapshot: CapacitySnapshot) {
        if self.initial_snapshot.is_none() {
            self.initial_snapshot = Some(snapshot);
        }
        self.closing_snapshot = Some(snapshot);
    }

    /// Append an outcome.
    ///
    /// Outcomes must arrive in batch order, one per candidate.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the outcome's rank is not the next
    /// expected position; the outcome is not recorded.
    pub fn record(&mut self, outcome: ExecutionOutcome) -> Result<(), DomainError> {
        let expected = self.outcomes.len();
        if outcome.rank() as usize != expected {
            return Err(DomainError::InvariantViolation {
                aggregate: "ResultAggregator".to_string(),
                invariant: "outcomes recorded once each, in batch order".to_string(),
                state: format!(
                    "expected rank {expected}, got rank {} for candidate {}",
                    outcome.rank(),
                    outcome.candidate_id()
                ),
            });
        }

        self.counts.increment(outcome.kind());
        if outcome.kind() == OutcomeKind::Committed {
            self.total_consumed = self.total_consumed.saturating_add(outcome.consumed());
        }
        self.outcomes.push(outcome);
        Ok(())
    }

    /// Outcomes recorded so far.
    #[must_use]
    pub const fn counts(&self) -> OutcomeCounts {
        self.counts
    }

    /// Number of outcomes recorded so far.
    #[must_use]
    pub fn recorded(&self) -> usize {
        self.outcomes.len()
    }

    /// Finish the cycle and hand out the read-only summary.
    ///
    /// The final snapshot is the closing snapshot when one was taken, the last
    /// admission-check snapshot otherwise.
    #[must_use]
    pub fn finish(self, status: CycleStatus, finished_at: Timestamp) -> CycleSummary {
        CycleSummary {
            cycle_id: self.cycle_id,
            status,
            counts: self.counts,
            total_consumed: self.total_consumed,
            initial_snapshot: self.initial_snapshot,
            final_snapshot: self.closing_snapshot.or(self.last_snapshot),
            outcomes: self.outcomes,
            started_at: self.started_at,
            finished_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::admission::{Candidate, CandidateBatch, OutcomeReason};
    use crate::domain::order::{OrderSide, OrderSpec};
    use crate::domain::shared::{CandidateId, Symbol};
    use rust_decimal_macros::dec;

    fn batch() -> CandidateBatch {
        CandidateBatch::new(
            [("a", 25_000), ("b", 24_500), ("c", 10_000)]
                .into_iter()
                .map(|(id, dollars)| {
                    Candidate::new(
                        CandidateId::new(id),
                        Symbol::new("SPY"),
                        Money::dollars(dollars),
                        OrderSpec::market(OrderSide::Buy, dec!(1)),
                    )
                })
                .collect(),
        )
    }

    fn ts(secs: u32) -> Timestamp {
        Timestamp::parse(&format!("2026-10-19T14:30:{secs:02}Z")).unwrap()
    }

    #[test]
    fn huge_commits_saturate_total_consumed() {
        let huge = Money::new(rust_decimal::Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0));
        let batch = CandidateBatch::new(
            ["a", "b"]
                .into_iter()
                .map(|id| {
                    Candidate::new(
                        CandidateId::new(id),
                        Symbol::new("SPY"),
                        huge,
                        OrderSpec::market(OrderSide::Buy, dec!(1)),
                    )
                })
                .collect(),
        );
        let mut agg = ResultAggregator::new(CycleId::new("cycle-huge"), ts(0));
        for candidate in &batch {
            agg.record(ExecutionOutcome::new(candidate, OutcomeReason::Accepted, ts(1)))
                .unwrap();
        }

        let summary = agg.finish(CycleStatus::Completed, ts(2));
        assert_eq!(summary.counts().committed, 2);
        assert_eq!(summary.total_consumed(), Money::new(rust_decimal::Decimal::MAX));
    }

    #[test]
    fn folds_outcomes_into_summary() {
        let batch = batch();
        let mut candidates = batch.iter();
        let mut agg = ResultAggregator::new(CycleId::new("cycle-1"), ts(0));

        agg.observe_snapshot(CapacitySnapshot::new(Money::dollars(50_000), ts(1)));
        let a = candidates.next().unwrap();
        agg.record(ExecutionOutcome::new(a, OutcomeReason::Accepted, ts(2)))
            .unwrap();

        agg.observe_snapshot(CapacitySnapshot::new(Money::dollars(25_000), ts(3)));
        let b = candidates.next().unwrap();
        agg.record(ExecutionOutcome::new(b, OutcomeReason::Accepted, ts(4)))
            .unwrap();

        agg.observe_snapshot(CapacitySnapshot::new(Money::dollars(500), ts(5)));
        let c = candidates.next().unwrap();
        agg.record(ExecutionOutcome::new(
            c,
            OutcomeReason::InsufficientCapacity {
                required: Money::dollars(10_000),
                admissible: Money::dollars(500),
            },
            ts(6),
        ))
        .unwrap();

        let summary = agg.finish(CycleStatus::Completed, ts(7));
        assert_eq!(summary.counts().committed, 2);
        assert_eq!(summary.counts().skipped_insufficient_capacity, 1);
        assert_eq!(summary.total_consumed(), Money::dollars(49_500));
        assert_eq!(
            summary.initial_snapshot().map(CapacitySnapshot::available),
            Some(Money::dollars(50_000))
        );
        assert_eq!(
            summary.final_snapshot().map(CapacitySnapshot::available),
            Some(Money::dollars(500))
        );
        assert!(summary.check_capacity_invariant().is_ok());
    }

    #[test]
    fn closing_snapshot_wins_over_last_check() {
        let mut agg = ResultAggregator::new(CycleId::new("cycle-1"), ts(0));
        agg.observe_snapshot(CapacitySnapshot::new(Money::dollars(100), ts(1)));
        agg.close_with_snapshot(CapacitySnapshot::new(Money::dollars(40), ts(2)));

        let summary = agg.finish(CycleStatus::Completed, ts(3));
        assert_eq!(
            summary.final_snapshot().map(CapacitySnapshot::available),
            Some(Money::dollars(40))
        );
    }

    #[test]
    fn closing_snapshot_alone_is_initial_and_final() {
        let mut agg = ResultAggregator::new(CycleId::new("empty"), ts(0));
        agg.close_with_snapshot(CapacitySnapshot::new(Money::dollars(75), ts(1)));

        let summary = agg.finish(CycleStatus::Completed, ts(2));
        assert_eq!(summary.initial_snapshot(), summary.final_snapshot());
        assert_eq!(summary.counts().total(), 0);
    }

    #[test]
    fn rejects_out_of_order_outcome() {
        let batch = batch();
        let second = batch.iter().nth(1).unwrap();
        let mut agg = ResultAggregator::new(CycleId::new("cycle-1"), ts(0));

        let err = agg
            .record(ExecutionOutcome::new(second, OutcomeReason::Accepted, ts(1)))
            .unwrap_err();
        assert!(err.to_string().contains("batch order"));
        assert_eq!(agg.recorded(), 0);
    }

    #[test]
    fn rejects_second_outcome_for_same_candidate() {
        let batch = batch();
        let first = batch.iter().next().unwrap();
        let mut agg = ResultAggregator::new(CycleId::new("cycle-1"), ts(0));

        agg.record(ExecutionOutcome::new(first, OutcomeReason::Accepted, ts(1)))
            .unwrap();
        assert!(
            agg.record(ExecutionOutcome::new(first, OutcomeReason::Accepted, ts(2)))
                .is_err()
        );
        assert_eq!(agg.counts().committed, 1);
    }
}
