//! Data Transfer Objects (DTOs)
//!
//! DTOs are used for the candidate batch input and the reporting records.

mod batch_dto;
mod report_dto;

pub use batch_dto::{BatchRequestDto, CandidateDto};
pub use report_dto::{CycleRecord, OutcomeRecord};
