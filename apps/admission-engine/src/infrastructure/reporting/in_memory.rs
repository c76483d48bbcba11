//! In-memory report sink for testing.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::application::dto::{CycleRecord, OutcomeRecord};
use crate::application::ports::{ReportError, ReportSinkPort};

/// Collects emitted records in memory.
///
/// Suitable for testing and development. Not for production use.
#[derive(Debug, Default)]
pub struct InMemoryReportSink {
    outcomes: Mutex<Vec<OutcomeRecord>>,
    summaries: Mutex<Vec<CycleRecord>>,
}

impl InMemoryReportSink {
    /// Create a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome records emitted so far.
    #[must_use]
    pub fn outcomes(&self) -> Vec<OutcomeRecord> {
        self.outcomes.lock().clone()
    }

    /// Cycle records emitted so far.
    #[must_use]
    pub fn summaries(&self) -> Vec<CycleRecord> {
        self.summaries.lock().clone()
    }

    /// Drop everything collected.
    pub fn clear(&self) {
        self.outcomes.lock().clear();
        self.summaries.lock().clear();
    }
}

#[async_trait]
impl ReportSinkPort for InMemoryReportSink {
    async fn emit_outcome(&self, record: &OutcomeRecord) -> Result<(), ReportError> {
        self.outcomes.lock().push(record.clone());
        Ok(())
    }

    async fn emit_summary(&self, record: &CycleRecord) -> Result<(), ReportError> {
        self.summaries.lock().push(record.clone());
        Ok(())
    }
}
