//! Admission Controller Use Case
//!
//! Walks a candidate batch in priority order and commits as many candidates
//! as the broker's *current* buying power allows:
//!
//! 1. Validate the candidate (never submitted if malformed or duplicated)
//! 2. Fetch a fresh capacity snapshot (every time, even right after a commit)
//! 3. Skip if the candidate does not fit the admissible capacity
//! 4. Otherwise submit and wait for the broker's answer
//! 5. Record the outcome, in batch order
//!
//! At most one submission is ever in flight. Capacity is never cached or
//! decremented locally; the broker is the only source of truth.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::ports::{
    CapacityOraclePort, ClockPort, GatewayError, OracleError, OrderGatewayPort,
    SubmissionResponse, SubmitOrderRequest, SystemClock,
};
use crate::domain::admission::{
    Candidate, CandidateBatch, CapacitySnapshot, CycleStatus, CycleSummary, ExecutionOutcome,
    OutcomeKind, OutcomeReason, ResultAggregator,
};
use crate::domain::shared::{BrokerId, CandidateId, CycleId, Money, OrderId};
use crate::observability;

/// Admission settings applied to every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    /// Capacity held back from admission.
    pub capacity_reserve: Money,
    /// Fetch one more snapshot after the last candidate.
    pub final_snapshot: bool,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            capacity_reserve: Money::ZERO,
            final_snapshot: true,
        }
    }
}

/// Why the loop stopped deciding candidates.
enum Halt {
    Cancelled,
    OracleUnavailable(String),
}

impl Halt {
    fn reason(&self) -> OutcomeReason {
        match self {
            Self::Cancelled => OutcomeReason::Cancelled,
            Self::OracleUnavailable(message) => OutcomeReason::CapacityUnknown {
                message: message.clone(),
            },
        }
    }

    fn into_status(self) -> CycleStatus {
        match self {
            Self::Cancelled => CycleStatus::Cancelled,
            Self::OracleUnavailable(message) => CycleStatus::OracleUnavailable { message },
        }
    }
}

/// Use case for running admission cycles against one broker account.
pub struct AdmissionController<O, G, C = SystemClock>
where
    O: CapacityOraclePort,
    G: OrderGatewayPort,
    C: ClockPort,
{
    oracle: Arc<O>,
    gateway: Arc<G>,
    clock: Arc<C>,
    policy: AdmissionPolicy,
    cycle_guard: Mutex<()>,
}

impl<O, G> AdmissionController<O, G, SystemClock>
where
    O: CapacityOraclePort,
    G: OrderGatewayPort,
{
    /// Create a controller using the wall clock.
    pub fn new(oracle: Arc<O>, gateway: Arc<G>, policy: AdmissionPolicy) -> Self {
        Self::with_clock(oracle, gateway, Arc::new(SystemClock), policy)
    }
}

impl<O, G, C> AdmissionController<O, G, C>
where
    O: CapacityOraclePort,
    G: OrderGatewayPort,
    C: ClockPort,
{
    /// Create a controller with an explicit clock.
    pub fn with_clock(oracle: Arc<O>, gateway: Arc<G>, clock: Arc<C>, policy: AdmissionPolicy) -> Self {
        Self {
            oracle,
            gateway,
            clock,
            policy,
            cycle_guard: Mutex::new(()),
        }
    }

    /// Admission settings.
    pub const fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Run one admission cycle over `batch`.
    ///
    /// Never fails: an oracle failure degrades the cycle and the summary
    /// still covers every candidate. `cancel` is checked between candidates
    /// only; a submission in flight always runs to its answer.
    ///
    /// Concurrent calls on the same controller run one after the other.
    pub async fn run_cycle(
        &self,
        cycle_id: CycleId,
        batch: &CandidateBatch,
        cancel: &CancellationToken,
    ) -> CycleSummary {
        let _guard = self.cycle_guard.lock().await;

        let span = tracing::info_span!(
            "admission_cycle",
            cycle_id = %cycle_id,
            candidates = batch.len(),
        );
        self.run_locked(cycle_id, batch, cancel).instrument(span).await
    }

    async fn run_locked(
        &self,
        cycle_id: CycleId,
        batch: &CandidateBatch,
        cancel: &CancellationToken,
    ) -> CycleSummary {
        tracing::info!(
            total_required = %batch.total_required(),
            reserve = %self.policy.capacity_reserve,
            "Admission cycle started"
        );

        let mut aggregator = ResultAggregator::new(cycle_id.clone(), self.clock.now());
        let mut seen: HashSet<&CandidateId> = HashSet::with_capacity(batch.len());
        let mut halt: Option<Halt> = None;

        for candidate in batch {
            if halt.is_none() && cancel.is_cancelled() {
                tracing::warn!(
                    remaining = batch.len() - aggregator.recorded(),
                    "Admission cycle cancelled, remaining candidates not attempted"
                );
                halt = Some(Halt::Cancelled);
            }

            let outcome = if let Some(halt) = &halt {
                ExecutionOutcome::new(candidate, halt.reason(), self.clock.now())
            } else if !seen.insert(candidate.id()) {
                ExecutionOutcome::new(candidate, OutcomeReason::DuplicateCandidate, self.clock.now())
            } else {
                match self.admit(&cycle_id, candidate, &mut aggregator).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(
                            candidate_id = %candidate.id(),
                            error = %e,
                            "Capacity oracle unavailable, aborting remaining commits"
                        );
                        let message = e.to_string();
                        halt = Some(Halt::OracleUnavailable(message.clone()));
                        ExecutionOutcome::new(
                            candidate,
                            OutcomeReason::CapacityUnknown { message },
                            self.clock.now(),
                        )
                    }
                }
            };

            self.record(&mut aggregator, outcome);
        }

        if halt.is_none() && self.policy.final_snapshot {
            match self.fetch_snapshot().await {
                Ok(snapshot) => aggregator.close_with_snapshot(snapshot),
                Err(e) => tracing::warn!(error = %e, "Closing capacity snapshot unavailable"),
            }
        }

        let status = halt.map_or(CycleStatus::Completed, Halt::into_status);
        let summary = aggregator.finish(status, self.clock.now());
        self.log_summary(&summary);
        summary
    }

    /// Decide one candidate. Errors only when the oracle fails.
    async fn admit(
        &self,
        cycle_id: &CycleId,
        candidate: &Candidate,
        aggregator: &mut ResultAggregator,
    ) -> Result<ExecutionOutcome, OracleError> {
        if let Err(e) = candidate.validate() {
            return Ok(ExecutionOutcome::new(
                candidate,
                OutcomeReason::InvalidCandidate {
                    message: e.to_string(),
                },
                self.clock.now(),
            ));
        }

        let snapshot = self.fetch_snapshot().await?;
        aggregator.observe_snapshot(snapshot);

        let required = candidate.required_capacity();
        let reserve = self.policy.capacity_reserve;
        if !snapshot.fits(required, reserve) {
            return Ok(ExecutionOutcome::new(
                candidate,
                OutcomeReason::InsufficientCapacity {
                    required,
                    admissible: snapshot.admissible(reserve),
                },
                self.clock.now(),
            )
            .with_snapshot(&snapshot));
        }

        let client_order_id = OrderId::for_candidate(cycle_id, candidate.id());
        let (reason, broker_order_id) = self.submit(candidate, client_order_id.clone(), &snapshot).await;

        let mut outcome = ExecutionOutcome::new(candidate, reason, self.clock.now())
            .with_snapshot(&snapshot)
            .with_client_order_id(client_order_id);
        if let Some(id) = broker_order_id {
            outcome = outcome.with_broker_order_id(id);
        }
        Ok(outcome)
    }

    /// Submit and classify the broker's answer. The broker order id is only
    /// present for accepted orders.
    async fn submit(
        &self,
        candidate: &Candidate,
        client_order_id: OrderId,
        snapshot: &CapacitySnapshot,
    ) -> (OutcomeReason, Option<BrokerId>) {
        let request = SubmitOrderRequest::new(
            client_order_id,
            candidate.symbol().clone(),
            candidate.order().clone(),
        );

        tracing::debug!(
            candidate_id = %candidate.id(),
            symbol = %candidate.symbol(),
            rank = candidate.rank(),
            required = %candidate.required_capacity(),
            available = %snapshot.available(),
            client_order_id = %request.client_order_id,
            "Submitting order"
        );

        let started = Instant::now();
        let response = self.gateway.submit_order(request).await;
        let latency = started.elapsed().as_secs_f64();

        match response {
            Ok(SubmissionResponse::Accepted(receipt)) => {
                observability::record_submission("accepted", latency);
                (OutcomeReason::Accepted, Some(receipt.broker_order_id))
            }
            Ok(SubmissionResponse::RejectedForCapacity { reason }) => {
                observability::record_submission("rejected_for_capacity", latency);
                observability::record_late_capacity_race();
                tracing::warn!(
                    candidate_id = %candidate.id(),
                    symbol = %candidate.symbol(),
                    required = %candidate.required_capacity(),
                    available = %snapshot.available(),
                    broker_reason = %reason,
                    "Late-detected capacity race: broker reported insufficient buying power after pre-check passed"
                );
                (OutcomeReason::LateCapacityRace { message: reason }, None)
            }
            Ok(SubmissionResponse::Rejected { reason }) => {
                observability::record_submission("rejected", latency);
                (OutcomeReason::BrokerRejected { message: reason }, None)
            }
            Err(e) => {
                observability::record_submission("error", latency);
                let failure = match &e {
                    GatewayError::Transport { .. } => "transport",
                    GatewayError::Ambiguous { .. } => "ambiguous",
                    GatewayError::Unexpected { .. } => "unexpected",
                };
                tracing::error!(
                    candidate_id = %candidate.id(),
                    error = %e,
                    failure,
                    "Order submission outcome unknown, not retrying"
                );
                let reason = OutcomeReason::GatewayFailure {
                    message: e.to_string(),
                };
                (reason, None)
            }
        }
    }

    async fn fetch_snapshot(&self) -> Result<CapacitySnapshot, OracleError> {
        let started = Instant::now();
        let result = self.oracle.fetch_capacity().await;
        observability::record_oracle_fetch(
            started.elapsed().as_secs_f64(),
            result.as_ref().ok().map(|s| s.available().amount()),
        );
        result
    }

    fn record(&self, aggregator: &mut ResultAggregator, outcome: ExecutionOutcome) {
        observability::record_outcome(outcome.kind().as_str());
        if outcome.kind() == OutcomeKind::Committed {
            observability::record_capacity_consumed(outcome.consumed().amount());
        }

        match outcome.kind() {
            OutcomeKind::Committed | OutcomeKind::SkippedInsufficientCapacity => tracing::info!(
                candidate_id = %outcome.candidate_id(),
                symbol = %outcome.symbol(),
                rank = outcome.rank(),
                outcome = outcome.kind().as_str(),
                reason = %outcome.reason(),
                "Candidate decided"
            ),
            OutcomeKind::FailedExternal | OutcomeKind::FailedValidation => tracing::warn!(
                candidate_id = %outcome.candidate_id(),
                symbol = %outcome.symbol(),
                rank = outcome.rank(),
                outcome = outcome.kind().as_str(),
                reason = %outcome.reason(),
                "Candidate failed"
            ),
            OutcomeKind::NotAttempted => tracing::debug!(
                candidate_id = %outcome.candidate_id(),
                rank = outcome.rank(),
                "Candidate not attempted"
            ),
        }

        if let Err(e) = aggregator.record(outcome) {
            tracing::error!(error = %e, "Outcome rejected by aggregator");
        }
    }

    fn log_summary(&self, summary: &CycleSummary) {
        observability::record_cycle(summary.status().as_str());

        if let Err(e) = summary.check_capacity_invariant() {
            // Only reachable when capacity was added to the account mid-cycle.
            tracing::warn!(error = %e, "Committed capacity exceeds opening snapshot");
        }

        let counts = summary.counts();
        tracing::info!(
            status = summary.status().as_str(),
            committed = counts.committed,
            skipped = counts.skipped_insufficient_capacity,
            failed_external = counts.failed_external,
            failed_validation = counts.failed_validation,
            not_attempted = counts.not_attempted,
            consumed = %summary.total_consumed(),
            "Admission cycle finished"
        );
    }
}
