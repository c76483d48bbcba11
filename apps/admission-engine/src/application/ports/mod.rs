//! Application Ports (Driver and Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driven Ports** (Secondary/Outbound): the broker (capacity oracle and
//!   order gateway), the reporting sink, and the clock

mod capacity_oracle_port;
mod clock_port;
mod order_gateway_port;
mod report_sink_port;

pub use capacity_oracle_port::{CapacityOraclePort, OracleError};
pub use clock_port::{ClockPort, SystemClock};
pub use order_gateway_port::{
    GatewayError, OrderGatewayPort, OrderReceipt, SubmissionResponse, SubmitOrderRequest,
};
pub use report_sink_port::{ReportError, ReportSinkPort};

#[cfg(test)]
pub use capacity_oracle_port::MockCapacityOraclePort;
#[cfg(test)]
pub use order_gateway_port::MockOrderGatewayPort;
