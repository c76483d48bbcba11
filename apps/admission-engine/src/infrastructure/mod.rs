//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - `broker/`: capacity oracle and order gateway (Alpaca, simulated)
//! - `reporting/`: outcome and summary sinks

pub mod broker;
pub mod reporting;
