//! Top-level errors for the admission engine binary.
//!
//! Everything that can stop a cycle from starting, or make its result
//! unusable, ends up as an `EngineError` with a stable reason code and a
//! process exit code.
//!
//! # Exit Codes
//!
//! | Code | Name | Usage |
//! |------|------|-------|
//! | 0 | Success | Cycle completed or was cancelled |
//! | 65 | Data Error | Candidate batch is malformed |
//! | 69 | Unavailable | Broker adapter could not be built |
//! | 70 | Software | Unexpected internal error |
//! | 74 | IO Error | Batch file or report sink failed |
//! | 75 | Temp Failure | Cycle degraded by an oracle outage |
//! | 78 | Config | Configuration invalid or credentials missing |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::ReportError;
use crate::config::{ConfigError, StartupValidationError};
use crate::infrastructure::broker::AlpacaError;
use crate::observability::MetricsError;

/// Error codes for the admission engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors
    /// Configuration could not be loaded or failed validation.
    InvalidConfig,
    /// Broker credentials missing for the configured mode.
    MissingCredentials,
    /// Candidate batch could not be read or parsed.
    InvalidBatch,

    // Runtime errors
    /// Broker adapter could not be constructed.
    BrokerUnavailable,
    /// The cycle ran but an oracle outage cut it short.
    CycleDegraded,
    /// Report sink rejected a record.
    ReportFailed,
    /// Metrics exporter failed to start.
    MetricsFailed,

    // Internal errors
    /// Unexpected internal error.
    InternalError,
}

impl ErrorCode {
    /// Process exit code (sysexits).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidBatch => 65,
            Self::BrokerUnavailable => 69,
            Self::InternalError => 70,
            Self::ReportFailed | Self::MetricsFailed => 74,
            Self::CycleDegraded => 75,
            Self::InvalidConfig | Self::MissingCredentials => 78,
        }
    }

    /// Stable reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::MissingCredentials => "MISSING_CREDENTIALS",
            Self::InvalidBatch => "INVALID_BATCH",
            Self::BrokerUnavailable => "BROKER_UNAVAILABLE",
            Self::CycleDegraded => "CYCLE_DEGRADED",
            Self::ReportFailed => "REPORT_FAILED",
            Self::MetricsFailed => "METRICS_FAILED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Engine error with a reason code and key/value context.
#[derive(Debug, Error)]
pub struct EngineError {
    code: ErrorCode,
    message: String,
    context: Vec<(String, String)>,
}

impl EngineError {
    /// Create a new error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Attach a context field.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Context fields.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.code.exit_code()
    }

    /// Malformed candidate batch.
    #[must_use]
    pub fn invalid_batch(source: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidBatch, message).with_context("source", source)
    }

    /// Oracle outage cut the cycle short.
    #[must_use]
    pub fn cycle_degraded(cycle_id: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CycleDegraded, message).with_context("cycle_id", cycle_id)
    }

    /// Unexpected internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)?;
        for (key, value) in &self.context {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorCode::InvalidConfig, err.to_string())
    }
}

impl From<StartupValidationError> for EngineError {
    fn from(err: StartupValidationError) -> Self {
        let code = match err {
            StartupValidationError::MissingCredentials { .. } => ErrorCode::MissingCredentials,
            StartupValidationError::InvalidConfiguration(_) => ErrorCode::InvalidConfig,
        };
        Self::new(code, err.to_string())
    }
}

impl From<AlpacaError> for EngineError {
    fn from(err: AlpacaError) -> Self {
        Self::new(ErrorCode::BrokerUnavailable, err.to_string()).with_context("broker", "alpaca")
    }
}

impl From<ReportError> for EngineError {
    fn from(err: ReportError) -> Self {
        Self::new(ErrorCode::ReportFailed, err.to_string())
    }
}

impl From<MetricsError> for EngineError {
    fn from(err: MetricsError) -> Self {
        Self::new(ErrorCode::MetricsFailed, err.to_string())
    }
}
