//! Broker Adapters
//!
//! Implementations of `CapacityOraclePort` and `OrderGatewayPort`.

pub mod alpaca;
pub mod simulated;

pub use alpaca::{AlpacaBrokerAdapter, AlpacaConfig, AlpacaEnvironment, AlpacaError};
pub use simulated::{BrokerCall, SimulatedBroker, SimulatedFill};
