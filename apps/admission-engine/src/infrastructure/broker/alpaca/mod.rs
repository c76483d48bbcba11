//! Alpaca Markets Broker Adapter
//!
//! Implementation of the capacity oracle and order gateway ports for the
//! Alpaca Markets trading API with:
//! - Jittered retries for account reads only
//! - Single-shot order submission with response classification
//! - Environment-aware safety checks (PAPER vs LIVE)

mod adapter;
mod api_types;
mod config;
mod error;
mod http_client;

pub use adapter::AlpacaBrokerAdapter;
pub use config::{AlpacaConfig, AlpacaEnvironment, RetryConfig};
pub use error::{AlpacaError, INSUFFICIENT_BUYING_POWER_CODE};
