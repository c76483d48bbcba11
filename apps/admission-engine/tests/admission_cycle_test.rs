//! Admission cycle integration tests.
//!
//! Runs the controller against the simulated broker, which keeps its own
//! buying power ledger the way a real broker account does.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use admission_engine::application::dto::{BatchRequestDto, CycleRecord};
use admission_engine::application::ports::ClockPort;
use admission_engine::application::use_cases::{
    AdmissionController, AdmissionPolicy, ReportCycleUseCase,
};
use admission_engine::domain::admission::{
    Candidate, CandidateBatch, CycleStatus, OutcomeKind, OutcomeReason,
};
use admission_engine::domain::order::{OrderSide, OrderSpec};
use admission_engine::domain::shared::{CandidateId, CycleId, Money, Symbol, Timestamp};
use admission_engine::infrastructure::broker::{BrokerCall, SimulatedBroker};
use admission_engine::infrastructure::reporting::InMemoryReportSink;

// =============================================================================
// Helpers
// =============================================================================

fn load_fixture(name: &str) -> BatchRequestDto {
    let path = format!("{}/tests/fixtures/{}.json", env!("CARGO_MANIFEST_DIR"), name);
    let json = std::fs::read_to_string(&path).unwrap();
    BatchRequestDto::from_json(&json).unwrap()
}

fn controller(broker: &Arc<SimulatedBroker>) -> AdmissionController<SimulatedBroker, SimulatedBroker> {
    AdmissionController::new(
        Arc::clone(broker),
        Arc::clone(broker),
        AdmissionPolicy::default(),
    )
}

/// Candidate whose limit order costs exactly `required` at the broker.
fn candidate(id: &str, symbol: &str, required: i64) -> Candidate {
    Candidate::new(
        CandidateId::new(id),
        Symbol::new(symbol),
        Money::dollars(required),
        OrderSpec::limit(OrderSide::Buy, Decimal::ONE, Decimal::from(required)),
    )
}

struct FixedClock(Timestamp);

impl ClockPort for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

// =============================================================================
// Sequential admission
// =============================================================================

#[tokio::test]
async fn commits_until_capacity_runs_out() {
    let broker = Arc::new(SimulatedBroker::new(Money::dollars(50_000)));
    let dto = load_fixture("batch_three_candidates");

    let summary = controller(&broker)
        .run_cycle(dto.cycle_id(), &dto.to_batch(), &CancellationToken::new())
        .await;

    let kinds: Vec<_> = summary.outcomes().iter().map(|o| o.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            OutcomeKind::Committed,
            OutcomeKind::Committed,
            OutcomeKind::SkippedInsufficientCapacity
        ]
    );
    assert_eq!(summary.status(), &CycleStatus::Completed);
    assert_eq!(summary.total_consumed(), Money::dollars(49_500));
    assert_eq!(
        summary.initial_snapshot().unwrap().available(),
        Money::dollars(50_000)
    );
    assert_eq!(summary.final_snapshot().unwrap().available(), Money::dollars(500));
    assert_eq!(broker.available(), Money::dollars(500));

    // C was checked against the post-commit balance, not the initial one
    assert_eq!(
        summary.outcomes()[2].checked_capacity(),
        Some(Money::dollars(500))
    );
}

#[tokio::test]
async fn every_submission_follows_its_own_capacity_fetch() {
    let broker = Arc::new(SimulatedBroker::new(Money::dollars(50_000)));
    let dto = load_fixture("batch_three_candidates");

    controller(&broker)
        .run_cycle(dto.cycle_id(), &dto.to_batch(), &CancellationToken::new())
        .await;

    let calls = broker.calls();
    for (i, call) in calls.iter().enumerate() {
        if matches!(call, BrokerCall::Submit(_)) {
            assert_eq!(calls[i - 1], BrokerCall::FetchCapacity, "call {i}: {calls:?}");
        }
    }
    // Three admission checks plus the closing snapshot
    assert_eq!(broker.oracle_calls(), 4);
    assert_eq!(broker.fills().len(), 2);
}

#[tokio::test]
async fn skip_does_not_stop_smaller_candidates() {
    let broker = Arc::new(SimulatedBroker::new(Money::dollars(10_000)));
    let batch = CandidateBatch::new(vec![
        candidate("big", "AAPL", 20_000),
        candidate("small", "MSFT", 4_000),
        candidate("medium", "NVDA", 7_000),
        candidate("tiny", "AMD", 1_000),
    ]);

    let summary = controller(&broker)
        .run_cycle(CycleId::new("skip"), &batch, &CancellationToken::new())
        .await;

    let committed: Vec<_> = summary
        .outcomes_of(OutcomeKind::Committed)
        .map(|o| o.symbol().as_str().to_string())
        .collect();
    assert_eq!(committed, vec!["MSFT", "AMD"]);
    assert_eq!(summary.counts().get(OutcomeKind::SkippedInsufficientCapacity), 2);
    assert_eq!(broker.available(), Money::dollars(5_000));
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn oracle_failure_degrades_the_rest_of_the_cycle() {
    let broker = Arc::new(SimulatedBroker::new(Money::dollars(50_000)));
    broker.fail_oracle_from_call(3);
    let dto = load_fixture("batch_five_candidates");

    let summary = controller(&broker)
        .run_cycle(dto.cycle_id(), &dto.to_batch(), &CancellationToken::new())
        .await;

    assert!(summary.is_degraded());
    assert!(matches!(
        summary.status(),
        CycleStatus::OracleUnavailable { .. }
    ));
    assert_eq!(summary.outcomes().len(), 5);
    assert_eq!(summary.counts().get(OutcomeKind::Committed), 2);
    for outcome in &summary.outcomes()[2..] {
        assert!(matches!(
            outcome.reason(),
            OutcomeReason::CapacityUnknown { .. }
        ));
        assert!(outcome.client_order_id().is_none());
    }

    // Nothing submitted after the failure, and no closing snapshot attempted
    assert_eq!(broker.fills().len(), 2);
    assert_eq!(broker.oracle_calls(), 3);

    let record = CycleRecord::from_summary(&summary);
    assert!(record.degraded);
    assert_eq!(record.status, "ORACLE_UNAVAILABLE");
    assert_eq!(record.failed_validation, 3);
}

#[tokio::test]
async fn late_capacity_race_is_a_skip() {
    let broker = Arc::new(SimulatedBroker::new(Money::dollars(50_000)));
    // Another consumer takes 40k between A's check and A's submission
    broker.drain_before_next_submission(Money::dollars(40_000));
    let dto = load_fixture("batch_three_candidates");

    let summary = controller(&broker)
        .run_cycle(dto.cycle_id(), &dto.to_batch(), &CancellationToken::new())
        .await;

    let outcomes = summary.outcomes();
    assert!(matches!(
        outcomes[0].reason(),
        OutcomeReason::LateCapacityRace { .. }
    ));
    assert_eq!(outcomes[0].kind(), OutcomeKind::SkippedInsufficientCapacity);
    assert_eq!(outcomes[0].consumed(), Money::ZERO);
    assert!(matches!(
        outcomes[1].reason(),
        OutcomeReason::InsufficientCapacity { .. }
    ));
    assert_eq!(outcomes[2].kind(), OutcomeKind::Committed);

    assert_eq!(summary.late_capacity_races(), 1);
    assert_eq!(summary.total_consumed(), Money::dollars(10_000));
    assert_eq!(broker.available(), Money::ZERO);
}

#[tokio::test]
async fn broker_rejection_and_transport_failure_are_external() {
    let broker = Arc::new(SimulatedBroker::new(Money::dollars(50_000)));
    broker.reject_symbol("AAPL", "asset is not tradable");
    broker.drop_submissions_for("MSFT");
    let dto = load_fixture("batch_three_candidates");

    let summary = controller(&broker)
        .run_cycle(dto.cycle_id(), &dto.to_batch(), &CancellationToken::new())
        .await;

    let outcomes = summary.outcomes();
    assert!(matches!(
        outcomes[0].reason(),
        OutcomeReason::BrokerRejected { .. }
    ));
    assert!(matches!(
        outcomes[1].reason(),
        OutcomeReason::GatewayFailure { .. }
    ));
    assert_eq!(outcomes[2].kind(), OutcomeKind::Committed);
    assert_eq!(summary.counts().get(OutcomeKind::FailedExternal), 2);
    assert!(!summary.is_degraded());
}

#[tokio::test]
async fn oversized_costs_are_skipped_without_overflow() {
    let huge = Money::new(Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0));
    let batch = CandidateBatch::new(
        ["a", "b"]
            .into_iter()
            .map(|id| {
                Candidate::new(
                    CandidateId::new(id),
                    Symbol::new("SPY"),
                    huge,
                    OrderSpec::limit(OrderSide::Buy, Decimal::ONE, huge.amount()),
                )
            })
            .collect(),
    );
    assert_eq!(batch.total_required(), Money::new(Decimal::MAX));

    let broker = Arc::new(SimulatedBroker::new(Money::dollars(50_000)));
    let summary = controller(&broker)
        .run_cycle(CycleId::new("huge"), &batch, &CancellationToken::new())
        .await;

    assert_eq!(summary.outcomes().len(), 2);
    assert_eq!(
        summary.counts().get(OutcomeKind::SkippedInsufficientCapacity),
        2
    );
    assert_eq!(summary.total_consumed(), Money::ZERO);
    assert!(broker.fills().is_empty());
}

#[tokio::test]
async fn order_whose_cost_overflows_is_rejected_by_the_broker() {
    let huge = Decimal::from_i128_with_scale(10_i128.pow(20), 0);
    let batch = CandidateBatch::new(vec![Candidate::new(
        CandidateId::new("overflow"),
        Symbol::new("SPY"),
        Money::dollars(1_000),
        OrderSpec::limit(OrderSide::Buy, huge, huge),
    )]);

    let broker = Arc::new(SimulatedBroker::new(Money::dollars(50_000)));
    let summary = controller(&broker)
        .run_cycle(CycleId::new("overflow"), &batch, &CancellationToken::new())
        .await;

    let outcome = &summary.outcomes()[0];
    assert_eq!(outcome.kind(), OutcomeKind::FailedExternal);
    assert!(matches!(
        outcome.reason(),
        OutcomeReason::BrokerRejected { message } if message == "order cost overflows"
    ));
    assert_eq!(broker.available(), Money::dollars(50_000));
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn cancelled_before_start_touches_nothing() {
    let broker = Arc::new(SimulatedBroker::new(Money::dollars(50_000)));
    let dto = load_fixture("batch_three_candidates");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = controller(&broker)
        .run_cycle(dto.cycle_id(), &dto.to_batch(), &cancel)
        .await;

    assert_eq!(summary.status(), &CycleStatus::Cancelled);
    assert_eq!(summary.counts().get(OutcomeKind::NotAttempted), 3);
    assert!(broker.calls().is_empty());
}

#[tokio::test]
async fn cancellation_lets_the_in_flight_submission_finish() {
    let broker = Arc::new(
        SimulatedBroker::new(Money::dollars(50_000)).with_latency(Duration::from_millis(200)),
    );
    let dto = load_fixture("batch_three_candidates");
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let summary = controller(&broker)
        .run_cycle(dto.cycle_id(), &dto.to_batch(), &cancel)
        .await;

    let kinds: Vec<_> = summary.outcomes().iter().map(|o| o.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            OutcomeKind::Committed,
            OutcomeKind::NotAttempted,
            OutcomeKind::NotAttempted
        ]
    );
    assert_eq!(summary.status(), &CycleStatus::Cancelled);
    assert_eq!(broker.fills().len(), 1);
}

// =============================================================================
// Single flight
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cycles_never_overlap_submissions() {
    let broker = Arc::new(
        SimulatedBroker::new(Money::dollars(10_000)).with_latency(Duration::from_millis(5)),
    );
    let controller = Arc::new(controller(&broker));

    let mut handles = Vec::new();
    for cycle in 0..4 {
        let controller = Arc::clone(&controller);
        handles.push(tokio::spawn(async move {
            let batch = CandidateBatch::new(
                (0..5)
                    .map(|i| candidate(&format!("c{cycle}-{i}"), "SPY", 1_000))
                    .collect(),
            );
            controller
                .run_cycle(
                    CycleId::new(format!("cycle-{cycle}")),
                    &batch,
                    &CancellationToken::new(),
                )
                .await
        }));
    }

    let mut committed = 0;
    for handle in handles {
        let summary = handle.await.unwrap();
        committed += summary.counts().get(OutcomeKind::Committed);
    }

    assert!(!broker.overlapped());
    assert_eq!(broker.max_in_flight(), 1);
    assert_eq!(committed, 10);
    assert_eq!(broker.available(), Money::ZERO);
}

// =============================================================================
// Replay
// =============================================================================

#[tokio::test]
async fn replay_on_fresh_broker_is_identical() {
    let dto = load_fixture("batch_three_candidates");
    let clock = Arc::new(FixedClock(
        Timestamp::parse("2026-10-19T14:30:00Z").unwrap(),
    ));

    let mut summaries = Vec::new();
    for _ in 0..2 {
        let broker = Arc::new(
            SimulatedBroker::new(Money::dollars(50_000)).with_clock(clock.clone()),
        );
        let controller = AdmissionController::with_clock(
            Arc::clone(&broker),
            broker,
            Arc::clone(&clock),
            AdmissionPolicy::default(),
        );
        summaries.push(
            controller
                .run_cycle(dto.cycle_id(), &dto.to_batch(), &CancellationToken::new())
                .await,
        );
    }

    assert_eq!(summaries[0], summaries[1]);
    assert_eq!(summaries[0].counts().get(OutcomeKind::Committed), 2);
    assert_eq!(
        CycleRecord::outcome_records(&summaries[0]),
        CycleRecord::outcome_records(&summaries[1])
    );
    assert_eq!(
        CycleRecord::from_summary(&summaries[0]),
        CycleRecord::from_summary(&summaries[1])
    );
}

#[tokio::test]
async fn replay_on_same_broker_cannot_double_submit() {
    let broker = Arc::new(SimulatedBroker::new(Money::dollars(100_000)));
    let dto = load_fixture("batch_three_candidates");
    let controller = controller(&broker);

    let first = controller
        .run_cycle(dto.cycle_id(), &dto.to_batch(), &CancellationToken::new())
        .await;
    let second = controller
        .run_cycle(dto.cycle_id(), &dto.to_batch(), &CancellationToken::new())
        .await;

    assert_eq!(first.counts().get(OutcomeKind::Committed), 3);
    // Same cycle id, same client order ids: the broker refuses the duplicates
    assert_eq!(second.counts().get(OutcomeKind::FailedExternal), 3);
    assert_eq!(broker.fills().len(), 3);
}

// =============================================================================
// Reporting
// =============================================================================

#[tokio::test]
async fn report_emits_every_outcome_then_the_summary() {
    let broker = Arc::new(SimulatedBroker::new(Money::dollars(50_000)));
    let dto = load_fixture("batch_three_candidates");
    let summary = controller(&broker)
        .run_cycle(dto.cycle_id(), &dto.to_batch(), &CancellationToken::new())
        .await;

    let sink = Arc::new(InMemoryReportSink::new());
    let record = ReportCycleUseCase::new(Arc::clone(&sink))
        .execute(&summary)
        .await
        .unwrap();

    let outcomes = sink.outcomes();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(
        outcomes.iter().map(|o| o.rank).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(outcomes[2].reason_code, "INSUFFICIENT_CAPACITY");
    assert!(outcomes[0].broker_order_id.is_some());

    assert_eq!(sink.summaries(), vec![record.clone()]);
    assert_eq!(record.cycle_id, "cycle-three-candidates");
    assert_eq!(record.committed, 2);
    assert_eq!(record.committed_symbols, "AAPL,MSFT");
    assert_eq!(record.total_consumed, Decimal::from(49_500));
    assert_eq!(record.final_capacity, Some(Decimal::from(500)));
}

// =============================================================================
// Properties
// =============================================================================

fn run_blocking(
    capacity: i64,
    required: &[i64],
) -> admission_engine::domain::admission::CycleSummary {
    let broker = Arc::new(SimulatedBroker::new(Money::dollars(capacity)));
    let batch = CandidateBatch::new(
        required
            .iter()
            .enumerate()
            .map(|(i, r)| candidate(&format!("p{i}"), "SPY", *r))
            .collect(),
    );

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(controller(&broker).run_cycle(
            CycleId::new("prop"),
            &batch,
            &CancellationToken::new(),
        ))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn committed_capacity_never_exceeds_initial(
        capacity in 0i64..100_000,
        required in prop::collection::vec(1i64..40_000, 0..12),
    ) {
        let summary = run_blocking(capacity, &required);

        prop_assert!(summary.total_consumed() <= Money::dollars(capacity));
        prop_assert!(summary.check_capacity_invariant().is_ok());
        prop_assert_eq!(summary.outcomes().len(), required.len());
        prop_assert_eq!(summary.counts().total(), required.len());

        // Outcomes stay in batch order
        for (i, outcome) in summary.outcomes().iter().enumerate() {
            prop_assert_eq!(outcome.rank() as usize, i);
        }
    }

    #[test]
    fn greedy_admission_matches_a_running_balance(
        capacity in 0i64..50_000,
        required in prop::collection::vec(1i64..20_000, 1..10),
    ) {
        let summary = run_blocking(capacity, &required);

        let mut balance = capacity;
        for (outcome, r) in summary.outcomes().iter().zip(&required) {
            if *r <= balance {
                balance -= r;
                prop_assert_eq!(outcome.kind(), OutcomeKind::Committed);
            } else {
                prop_assert_eq!(outcome.kind(), OutcomeKind::SkippedInsufficientCapacity);
            }
        }
    }
}
