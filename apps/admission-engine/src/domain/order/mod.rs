//! Order Specification
//!
//! The order a candidate wants placed. The admission engine never interprets
//! it beyond structural validation; the gateway translates it to the broker's
//! wire format.

mod order_spec;

pub use order_spec::{OrderSide, OrderSpec, OrderType, TimeInForce};
