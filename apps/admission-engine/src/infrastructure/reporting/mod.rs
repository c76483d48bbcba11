//! Reporting Adapters
//!
//! Implementations of `ReportSinkPort`.

pub mod in_memory;
pub mod tracing_sink;

pub use in_memory::InMemoryReportSink;
pub use tracing_sink::TracingReportSink;
