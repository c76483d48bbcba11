//! Report Sink Port (Driven Port)
//!
//! Receives per-outcome records and the cycle record. Records carry scalar
//! fields only.

use async_trait::async_trait;

use crate::application::dto::{CycleRecord, OutcomeRecord};

/// Reporting error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReportError {
    /// The sink could not be reached.
    #[error("Report sink unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// The record could not be encoded.
    #[error("Report serialization error: {message}")]
    Serialization {
        /// Error details.
        message: String,
    },
}

/// Port for emitting cycle reports.
#[async_trait]
pub trait ReportSinkPort: Send + Sync {
    /// Emit one outcome record.
    async fn emit_outcome(&self, record: &OutcomeRecord) -> Result<(), ReportError>;

    /// Emit the cycle record.
    async fn emit_summary(&self, record: &CycleRecord) -> Result<(), ReportError>;
}
