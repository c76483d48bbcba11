//! Report Cycle Use Case

use std::sync::Arc;

use crate::application::dto::CycleRecord;
use crate::application::ports::{ReportError, ReportSinkPort};
use crate::domain::admission::CycleSummary;

/// Use case for handing a finished cycle to the reporting sink.
pub struct ReportCycleUseCase<S>
where
    S: ReportSinkPort,
{
    sink: Arc<S>,
}

impl<S> ReportCycleUseCase<S>
where
    S: ReportSinkPort,
{
    /// Create a new ReportCycleUseCase.
    pub const fn new(sink: Arc<S>) -> Self {
        Self { sink }
    }

    /// Emit every outcome record in batch order, then the cycle record.
    ///
    /// Stops at the first sink error.
    pub async fn execute(&self, summary: &CycleSummary) -> Result<CycleRecord, ReportError> {
        for record in CycleRecord::outcome_records(summary) {
            self.sink.emit_outcome(&record).await?;
        }

        let record = CycleRecord::from_summary(summary);
        self.sink.emit_summary(&record).await?;
        Ok(record)
    }
}
