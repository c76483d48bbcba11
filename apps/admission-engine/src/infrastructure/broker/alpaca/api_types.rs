//! Alpaca API request and response types.
//!
//! These types map directly to Alpaca's REST API format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::{OrderReceipt, SubmitOrderRequest};
use crate::domain::order::{OrderSide, OrderType, TimeInForce};
use crate::domain::shared::{BrokerId, OrderId};

// ============================================================================
// Order Request Types
// ============================================================================

/// Order request for Alpaca API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlpacaOrderRequest {
    /// Stock symbol.
    pub symbol: String,
    /// Quantity (shares).
    pub qty: String,
    /// Order side.
    pub side: String,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: String,
    /// Time in force.
    pub time_in_force: String,
    /// Limit price (for limit orders).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<String>,
    /// Stop price (for stop orders).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<String>,
    /// Client order ID.
    pub client_order_id: String,
    /// Extended hours trading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_hours: Option<bool>,
}

impl From<&SubmitOrderRequest> for AlpacaOrderRequest {
    fn from(request: &SubmitOrderRequest) -> Self {
        let order = &request.order;

        let side = match order.side {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        };

        let order_type = match order.order_type {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
            OrderType::Stop => "stop",
            OrderType::StopLimit => "stop_limit",
        };

        let time_in_force = match order.time_in_force {
            TimeInForce::Day => "day",
            TimeInForce::Gtc => "gtc",
            TimeInForce::Ioc => "ioc",
            TimeInForce::Fok => "fok",
        };

        Self {
            symbol: request.symbol.as_str().to_string(),
            qty: order.quantity.normalize().to_string(),
            side: side.to_string(),
            order_type: order_type.to_string(),
            time_in_force: time_in_force.to_string(),
            limit_price: order.limit_price.map(|p| p.to_string()),
            stop_price: order.stop_price.map(|p| p.to_string()),
            client_order_id: request.client_order_id.as_str().to_string(),
            extended_hours: order.extended_hours.then_some(true),
        }
    }
}

// ============================================================================
// Order Response Types
// ============================================================================

/// Order response from Alpaca API.
///
/// Only the fields the gateway reads; Alpaca sends many more.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaOrderResponse {
    /// Broker order ID.
    pub id: String,
    /// Client order ID.
    pub client_order_id: String,
    /// Symbol.
    #[serde(default)]
    pub symbol: Option<String>,
    /// Order status.
    pub status: String,
}

impl AlpacaOrderResponse {
    /// Returns true if Alpaca recorded the order but already rejected it.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.status.eq_ignore_ascii_case("rejected")
    }

    /// Convert to an `OrderReceipt`.
    #[must_use]
    pub fn to_receipt(&self) -> OrderReceipt {
        OrderReceipt {
            broker_order_id: BrokerId::new(&self.id),
            client_order_id: OrderId::new(&self.client_order_id),
            status: self.status.to_lowercase(),
        }
    }
}

// ============================================================================
// Account Types
// ============================================================================

/// Account response from Alpaca API.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaAccountResponse {
    /// Account ID.
    pub id: String,
    /// Account status (e.g. "ACTIVE").
    #[serde(default)]
    pub status: Option<String>,
    /// Buying power.
    pub buying_power: String,
    /// Trading blocked flag.
    #[serde(default)]
    pub trading_blocked: bool,
}

impl AlpacaAccountResponse {
    /// Parse the buying power figure.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the field is not a decimal.
    pub fn buying_power(&self) -> Result<Decimal, String> {
        self.buying_power
            .trim()
            .parse()
            .map_err(|e| format!("buying_power {:?} is not a decimal: {e}", self.buying_power))
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error response from Alpaca API.
///
/// Alpaca sends the code as a number; some proxies send a string.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaErrorResponse {
    /// Error code.
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    /// Error message.
    pub message: String,
}

impl AlpacaErrorResponse {
    /// Error code as text.
    #[must_use]
    pub fn code_string(&self) -> Option<String> {
        match &self.code {
            Some(serde_json::Value::String(code)) => Some(code.clone()),
            Some(serde_json::Value::Number(code)) => Some(code.to_string()),
            _ => None,
        }
    }
}
