//! Admission Bounded Context
//!
//! Candidates competing for one broker-tracked buying power ledger, the
//! capacity snapshots they are admitted against, and the per-cycle record of
//! what happened to each of them.

pub mod candidate;
pub mod outcome;
pub mod services;
pub mod snapshot;
pub mod summary;

pub use candidate::{Candidate, CandidateBatch};
pub use outcome::{ExecutionOutcome, OutcomeKind, OutcomeReason};
pub use services::ResultAggregator;
pub use snapshot::CapacitySnapshot;
pub use summary::{CycleStatus, CycleSummary, OutcomeCounts};
