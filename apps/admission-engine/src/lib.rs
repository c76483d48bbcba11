// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Admission Engine - Rust Core Library
//!
//! Serialized admission control for a batch of order candidates that all
//! draw on one broker-tracked buying power ledger.
//!
//! Each candidate is admitted against a capacity snapshot fetched
//! immediately before its own submission, and at most one order is in
//! flight at a time. The cycle ends with a scalar-typed summary of what
//! happened to every candidate.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (value objects, domain services)
//!   - `admission`: Candidates, capacity snapshots, outcomes, cycle summary,
//!     result aggregator
//!   - `order`: Order specification passed through to the broker
//!   - `shared`: Money, symbols, timestamps, identifiers
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: `CapacityOraclePort`, `OrderGatewayPort`, `ReportSinkPort`, `ClockPort`
//!   - `use_cases`: `AdmissionController`, `ReportCycleUseCase`
//!   - `dto`: Candidate batch input and reporting records
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `broker`: Alpaca REST adapter and the in-process simulated broker
//!   - `reporting`: Tracing and in-memory report sinks
//!
//! Cross-cutting: `config` (YAML), `observability` (Prometheus),
//! `telemetry` (tracing / OpenTelemetry), `error` (exit codes).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting Concerns
// =============================================================================

/// YAML configuration loading and validation.
pub mod config;

/// Top-level error type and exit codes.
pub mod error;

/// Prometheus metrics.
pub mod observability;

/// Tracing subscriber and OpenTelemetry setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::admission::{
    Candidate, CandidateBatch, CapacitySnapshot, CycleStatus, CycleSummary, ExecutionOutcome,
    OutcomeCounts, OutcomeKind, OutcomeReason, ResultAggregator,
};
pub use domain::order::{OrderSide, OrderSpec, OrderType, TimeInForce};
pub use domain::shared::{BrokerId, CandidateId, CycleId, Money, OrderId, Symbol, Timestamp};

// Application re-exports
pub use application::dto::{BatchRequestDto, CandidateDto, CycleRecord, OutcomeRecord};
pub use application::ports::{
    CapacityOraclePort, ClockPort, GatewayError, OracleError, OrderGatewayPort, ReportSinkPort,
    SubmissionResponse, SubmitOrderRequest, SystemClock,
};
pub use application::use_cases::{AdmissionController, AdmissionPolicy, ReportCycleUseCase};

// Infrastructure re-exports
pub use infrastructure::broker::{
    AlpacaBrokerAdapter, AlpacaConfig, AlpacaEnvironment, AlpacaError, SimulatedBroker,
};
pub use infrastructure::reporting::{InMemoryReportSink, TracingReportSink};

pub use error::{EngineError, ErrorCode};
