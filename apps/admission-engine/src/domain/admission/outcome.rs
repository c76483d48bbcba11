//! Per-candidate execution outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::{BrokerId, CandidateId, Money, OrderId, Symbol, Timestamp};

use super::candidate::Candidate;
use super::snapshot::CapacitySnapshot;

/// What happened to a candidate in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    /// Accepted by the broker; its capacity is consumed.
    Committed,
    /// Did not fit the capacity available when it was checked.
    SkippedInsufficientCapacity,
    /// The broker rejected it, or the submission outcome is unknown.
    FailedExternal,
    /// Never submitted: malformed, duplicated, or capacity unknown.
    FailedValidation,
    /// The cycle was cancelled before this candidate was reached.
    NotAttempted,
}

impl OutcomeKind {
    /// Stable reason string for records and metrics labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Committed => "COMMITTED",
            Self::SkippedInsufficientCapacity => "SKIPPED_INSUFFICIENT_CAPACITY",
            Self::FailedExternal => "FAILED_EXTERNAL",
            Self::FailedValidation => "FAILED_VALIDATION",
            Self::NotAttempted => "NOT_ATTEMPTED",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a candidate ended up with its outcome.
///
/// Every reason maps to exactly one [`OutcomeKind`], so the two can never
/// disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeReason {
    /// The broker accepted the order.
    Accepted,
    /// Pre-submission check: the order did not fit.
    InsufficientCapacity {
        /// Capacity the candidate needed.
        required: Money,
        /// Capacity admissible at the check.
        admissible: Money,
    },
    /// The pre-check passed but the broker reported insufficient buying power.
    LateCapacityRace {
        /// Broker message.
        message: String,
    },
    /// The broker rejected the order for a non-capacity reason.
    BrokerRejected {
        /// Broker message.
        message: String,
    },
    /// Transport failure or ambiguous response while submitting.
    GatewayFailure {
        /// Error description.
        message: String,
    },
    /// The candidate failed structural validation.
    InvalidCandidate {
        /// Validation error.
        message: String,
    },
    /// The candidate id already appeared earlier in the batch.
    DuplicateCandidate,
    /// The capacity oracle failed; no admission decision was possible.
    CapacityUnknown {
        /// Oracle error.
        message: String,
    },
    /// Cancellation or deadline reached before this candidate.
    Cancelled,
}

impl OutcomeReason {
    /// The outcome kind this reason produces.
    #[must_use]
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::Accepted => OutcomeKind::Committed,
            Self::InsufficientCapacity { .. } | Self::LateCapacityRace { .. } => {
                OutcomeKind::SkippedInsufficientCapacity
            }
            Self::BrokerRejected { .. } | Self::GatewayFailure { .. } => {
                OutcomeKind::FailedExternal
            }
            Self::InvalidCandidate { .. }
            | Self::DuplicateCandidate
            | Self::CapacityUnknown { .. } => OutcomeKind::FailedValidation,
            Self::Cancelled => OutcomeKind::NotAttempted,
        }
    }

    /// Stable code string.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::InsufficientCapacity { .. } => "INSUFFICIENT_CAPACITY",
            Self::LateCapacityRace { .. } => "LATE_CAPACITY_RACE",
            Self::BrokerRejected { .. } => "BROKER_REJECTED",
            Self::GatewayFailure { .. } => "GATEWAY_FAILURE",
            Self::InvalidCandidate { .. } => "INVALID_CANDIDATE",
            Self::DuplicateCandidate => "DUPLICATE_CANDIDATE",
            Self::CapacityUnknown { .. } => "CAPACITY_UNKNOWN",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OutcomeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted by broker"),
            Self::InsufficientCapacity {
                required,
                admissible,
            } => write!(f, "requires {required}, only {admissible} admissible"),
            Self::LateCapacityRace { message } => {
                write!(f, "broker reported insufficient buying power: {message}")
            }
            Self::BrokerRejected { message } => write!(f, "rejected by broker: {message}"),
            Self::GatewayFailure { message } => write!(f, "submission failed: {message}"),
            Self::InvalidCandidate { message } => write!(f, "invalid candidate: {message}"),
            Self::DuplicateCandidate => write!(f, "duplicate candidate id in batch"),
            Self::CapacityUnknown { message } => write!(f, "capacity unknown: {message}"),
            Self::Cancelled => write!(f, "cycle cancelled before candidate was reached"),
        }
    }
}

/// The recorded result for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    candidate_id: CandidateId,
    symbol: Symbol,
    rank: u32,
    required_capacity: Money,
    reason: OutcomeReason,
    consumed: Money,
    checked_capacity: Option<Money>,
    client_order_id: Option<OrderId>,
    broker_order_id: Option<BrokerId>,
    recorded_at: Timestamp,
}

impl ExecutionOutcome {
    /// Create an outcome for a candidate.
    ///
    /// Consumed capacity is the candidate's required capacity when the reason
    /// is [`OutcomeReason::Accepted`], zero otherwise.
    #[must_use]
    pub fn new(candidate: &Candidate, reason: OutcomeReason, recorded_at: Timestamp) -> Self {
        let consumed = if reason.kind() == OutcomeKind::Committed {
            candidate.required_capacity()
        } else {
            Money::ZERO
        };

        Self {
            candidate_id: candidate.id().clone(),
            symbol: candidate.symbol().clone(),
            rank: candidate.rank(),
            required_capacity: candidate.required_capacity(),
            reason,
            consumed,
            checked_capacity: None,
            client_order_id: None,
            broker_order_id: None,
            recorded_at,
        }
    }

    /// Attach the snapshot the admission decision was made against.
    #[must_use]
    pub const fn with_snapshot(mut self, snapshot: &CapacitySnapshot) -> Self {
        self.checked_capacity = Some(snapshot.available());
        self
    }

    /// Attach the client order id used for the submission.
    #[must_use]
    pub fn with_client_order_id(mut self, id: OrderId) -> Self {
        self.client_order_id = Some(id);
        self
    }

    /// Attach the broker's order id.
    #[must_use]
    pub fn with_broker_order_id(mut self, id: BrokerId) -> Self {
        self.broker_order_id = Some(id);
        self
    }

    /// Candidate id.
    #[must_use]
    pub const fn candidate_id(&self) -> &CandidateId {
        &self.candidate_id
    }

    /// Candidate symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Candidate rank in its batch.
    #[must_use]
    pub const fn rank(&self) -> u32 {
        self.rank
    }

    /// Capacity the candidate required.
    #[must_use]
    pub const fn required_capacity(&self) -> Money {
        self.required_capacity
    }

    /// Outcome kind.
    #[must_use]
    pub const fn kind(&self) -> OutcomeKind {
        self.reason.kind()
    }

    /// Outcome reason.
    #[must_use]
    pub const fn reason(&self) -> &OutcomeReason {
        &self.reason
    }

    /// Capacity consumed (zero unless committed).
    #[must_use]
    pub const fn consumed(&self) -> Money {
        self.consumed
    }

    /// Available capacity at the admission check, if one happened.
    #[must_use]
    pub const fn checked_capacity(&self) -> Option<Money> {
        self.checked_capacity
    }

    /// Client order id, if the candidate was submitted.
    #[must_use]
    pub const fn client_order_id(&self) -> Option<&OrderId> {
        self.client_order_id.as_ref()
    }

    /// Broker order id, if the broker accepted.
    #[must_use]
    pub const fn broker_order_id(&self) -> Option<&BrokerId> {
        self.broker_order_id.as_ref()
    }

    /// When the outcome was recorded.
    #[must_use]
    pub const fn recorded_at(&self) -> Timestamp {
        self.recorded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderSide, OrderSpec};
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn candidate() -> Candidate {
        Candidate::new(
            CandidateId::new("c1"),
            Symbol::new("AAPL"),
            Money::dollars(25_000),
            OrderSpec::market(OrderSide::Buy, dec!(100)),
        )
    }

    #[test_case(OutcomeReason::Accepted, OutcomeKind::Committed ; "accepted")]
    #[test_case(
        OutcomeReason::InsufficientCapacity { required: Money::dollars(2), admissible: Money::dollars(1) },
        OutcomeKind::SkippedInsufficientCapacity ; "pre-check skip"
    )]
    #[test_case(
        OutcomeReason::LateCapacityRace { message: "insufficient buying power".into() },
        OutcomeKind::SkippedInsufficientCapacity ; "late race"
    )]
    #[test_case(OutcomeReason::BrokerRejected { message: "halted".into() }, OutcomeKind::FailedExternal ; "rejected")]
    #[test_case(OutcomeReason::GatewayFailure { message: "timeout".into() }, OutcomeKind::FailedExternal ; "gateway failure")]
    #[test_case(OutcomeReason::InvalidCandidate { message: "qty".into() }, OutcomeKind::FailedValidation ; "invalid")]
    #[test_case(OutcomeReason::DuplicateCandidate, OutcomeKind::FailedValidation ; "duplicate")]
    #[test_case(OutcomeReason::CapacityUnknown { message: "down".into() }, OutcomeKind::FailedValidation ; "capacity unknown")]
    #[test_case(OutcomeReason::Cancelled, OutcomeKind::NotAttempted ; "cancelled")]
    fn reason_maps_to_kind(reason: OutcomeReason, expected: OutcomeKind) {
        assert_eq!(reason.kind(), expected);
    }

    #[test]
    fn committed_outcome_consumes_required_capacity() {
        let outcome = ExecutionOutcome::new(&candidate(), OutcomeReason::Accepted, Timestamp::now());
        assert_eq!(outcome.consumed(), Money::dollars(25_000));
        assert_eq!(outcome.kind(), OutcomeKind::Committed);
    }

    #[test]
    fn non_committed_outcome_consumes_nothing() {
        let outcome = ExecutionOutcome::new(
            &candidate(),
            OutcomeReason::LateCapacityRace {
                message: "insufficient buying power".into(),
            },
            Timestamp::now(),
        );
        assert_eq!(outcome.consumed(), Money::ZERO);
        assert_eq!(outcome.required_capacity(), Money::dollars(25_000));
    }

    #[test]
    fn capacity_unknown_display_carries_note() {
        let reason = OutcomeReason::CapacityUnknown {
            message: "connection refused".into(),
        };
        assert!(reason.to_string().starts_with("capacity unknown"));
        assert_eq!(reason.code(), "CAPACITY_UNKNOWN");
    }

    #[test]
    fn builder_attaches_ids_and_snapshot() {
        let snapshot = CapacitySnapshot::new(Money::dollars(50_000), Timestamp::now());
        let outcome = ExecutionOutcome::new(&candidate(), OutcomeReason::Accepted, Timestamp::now())
            .with_snapshot(&snapshot)
            .with_client_order_id(OrderId::new("coid-1"))
            .with_broker_order_id(BrokerId::new("brk-1"));

        assert_eq!(outcome.checked_capacity(), Some(Money::dollars(50_000)));
        assert_eq!(outcome.client_order_id().map(OrderId::as_str), Some("coid-1"));
        assert_eq!(outcome.broker_order_id().map(BrokerId::as_str), Some("brk-1"));
    }
}
