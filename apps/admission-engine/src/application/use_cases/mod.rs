//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod admission;
mod report_cycle;

pub use admission::{AdmissionController, AdmissionPolicy};
pub use report_cycle::ReportCycleUseCase;
