//! Order Gateway Port (Driven Port)
//!
//! Submits one order to the broker and classifies the answer. Submission is
//! not idempotent: implementations must never retry on their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::order::OrderSpec;
use crate::domain::shared::{BrokerId, OrderId, Symbol};

/// Request to submit an order to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOrderRequest {
    /// Client order ID.
    pub client_order_id: OrderId,
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Order specification, passed through untouched.
    pub order: OrderSpec,
}

impl SubmitOrderRequest {
    /// Create a request.
    #[must_use]
    pub const fn new(client_order_id: OrderId, symbol: Symbol, order: OrderSpec) -> Self {
        Self {
            client_order_id,
            symbol,
            order,
        }
    }
}

/// Receipt for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// Broker-assigned order ID.
    pub broker_order_id: BrokerId,
    /// Client order ID echoed back.
    pub client_order_id: OrderId,
    /// Broker status string at acceptance (e.g. "accepted", "new").
    pub status: String,
}

/// Definitive broker answer to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SubmissionResponse {
    /// The broker accepted the order.
    Accepted(OrderReceipt),
    /// The broker rejected the order for lack of buying power.
    RejectedForCapacity {
        /// Broker message.
        reason: String,
    },
    /// The broker rejected the order for any other reason.
    Rejected {
        /// Broker message.
        reason: String,
    },
}

impl SubmissionResponse {
    /// Returns true if the order was accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Order gateway error: the submission outcome is not a definitive answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request did not complete.
    #[error("Order gateway transport error: {message}")]
    Transport {
        /// Error details.
        message: String,
    },

    /// A response arrived but could not be classified.
    #[error("Ambiguous order response: {message}")]
    Ambiguous {
        /// Error details.
        message: String,
    },

    /// Anything else the gateway could not handle.
    #[error("Order gateway error: {message}")]
    Unexpected {
        /// Error details.
        message: String,
    },
}

/// Port for submitting orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderGatewayPort: Send + Sync {
    /// Submit one order and wait for a definitive answer.
    async fn submit_order(
        &self,
        request: SubmitOrderRequest,
    ) -> Result<SubmissionResponse, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderSide, OrderSpec};
    use rust_decimal_macros::dec;

    #[test]
    fn response_serializes_with_result_tag() {
        let response = SubmissionResponse::RejectedForCapacity {
            reason: "insufficient buying power".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"result\":\"rejected_for_capacity\""));
        assert!(!response.is_accepted());
    }

    #[test]
    fn request_carries_order_untouched() {
        let order = OrderSpec::limit(OrderSide::Buy, dec!(10), dec!(185.50));
        let request = SubmitOrderRequest::new(OrderId::new("c-1"), Symbol::new("AAPL"), order.clone());
        assert_eq!(request.order, order);
    }
}
