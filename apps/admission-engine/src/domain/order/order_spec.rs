//! Order specification value objects.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy order.
    Buy,
    /// Sell order.
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Execute at the prevailing price.
    Market,
    /// Execute at the limit price or better.
    Limit,
    /// Becomes a market order once the stop price trades.
    Stop,
    /// Becomes a limit order once the stop price trades.
    StopLimit,
}

impl OrderType {
    /// Returns true if this type needs a limit price.
    #[must_use]
    pub const fn requires_limit_price(&self) -> bool {
        matches!(self, Self::Limit | Self::StopLimit)
    }

    /// Returns true if this type needs a stop price.
    #[must_use]
    pub const fn requires_stop_price(&self) -> bool {
        matches!(self, Self::Stop | Self::StopLimit)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MARKET"),
            Self::Limit => write!(f, "LIMIT"),
            Self::Stop => write!(f, "STOP"),
            Self::StopLimit => write!(f, "STOP_LIMIT"),
        }
    }
}

/// Time in force specifying order validity duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Valid for current trading day only.
    #[default]
    Day,
    /// Good-til-canceled.
    Gtc,
    /// Immediate-or-cancel.
    Ioc,
    /// Fill-or-kill.
    Fok,
}

/// The order a candidate carries through to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Quantity (shares or contracts).
    pub quantity: Decimal,
    /// Limit price (limit and stop-limit orders).
    #[serde(default)]
    pub limit_price: Option<Decimal>,
    /// Stop price (stop and stop-limit orders).
    #[serde(default)]
    pub stop_price: Option<Decimal>,
    /// Time in force.
    #[serde(default)]
    pub time_in_force: TimeInForce,
    /// Extended hours trading.
    #[serde(default)]
    pub extended_hours: bool,
}

impl OrderSpec {
    /// Create a market order spec.
    #[must_use]
    pub const fn market(side: OrderSide, quantity: Decimal) -> Self {
        Self {
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
            stop_price: None,
            time_in_force: TimeInForce::Day,
            extended_hours: false,
        }
    }

    /// Create a limit order spec.
    #[must_use]
    pub const fn limit(side: OrderSide, quantity: Decimal, limit_price: Decimal) -> Self {
        Self {
            side,
            order_type: OrderType::Limit,
            quantity,
            limit_price: Some(limit_price),
            stop_price: None,
            time_in_force: TimeInForce::Day,
            extended_hours: false,
        }
    }

    /// Structural validation performed before anything is sent to a broker.
    ///
    /// # Errors
    ///
    /// Returns error if quantity or prices are missing or non-positive.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.quantity <= Decimal::ZERO {
            return Err(invalid("quantity", "must be positive"));
        }
        if self.order_type.requires_limit_price() {
            match self.limit_price {
                Some(p) if p > Decimal::ZERO => {}
                Some(_) => return Err(invalid("limit_price", "must be positive")),
                None => {
                    return Err(invalid(
                        "limit_price",
                        &format!("required for {} orders", self.order_type),
                    ));
                }
            }
        }
        if self.order_type.requires_stop_price() {
            match self.stop_price {
                Some(p) if p > Decimal::ZERO => {}
                Some(_) => return Err(invalid("stop_price", "must be positive")),
                None => {
                    return Err(invalid(
                        "stop_price",
                        &format!("required for {} orders", self.order_type),
                    ));
                }
            }
        }
        if self.extended_hours
            && !(self.order_type == OrderType::Limit && self.time_in_force == TimeInForce::Day)
        {
            return Err(DomainError::BusinessRuleViolation {
                rule: "EXTENDED_HOURS".to_string(),
                message: "extended hours requires a DAY limit order".to_string(),
            });
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> DomainError {
    DomainError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn market_spec_is_valid() {
        assert!(OrderSpec::market(OrderSide::Buy, dec!(100)).validate().is_ok());
    }

    #[test]
    fn zero_quantity_is_invalid() {
        let err = OrderSpec::market(OrderSide::Buy, Decimal::ZERO)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("quantity"));
    }

    #[test]
    fn limit_without_price_is_invalid() {
        let mut spec = OrderSpec::limit(OrderSide::Buy, dec!(10), dec!(150));
        spec.limit_price = None;
        let err = spec.validate().unwrap_err();
        assert!(err.to_string().contains("limit_price"));
    }

    #[test]
    fn stop_limit_needs_both_prices() {
        let mut spec = OrderSpec::limit(OrderSide::Sell, dec!(10), dec!(150));
        spec.order_type = OrderType::StopLimit;
        assert!(spec.validate().is_err());

        spec.stop_price = Some(dec!(149));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn extended_hours_requires_day_limit() {
        let mut spec = OrderSpec::market(OrderSide::Buy, dec!(5));
        spec.extended_hours = true;
        assert!(spec.validate().is_err());

        let mut limit = OrderSpec::limit(OrderSide::Buy, dec!(5), dec!(10));
        limit.extended_hours = true;
        assert!(limit.validate().is_ok());
    }

    #[test]
    fn deserializes_with_defaults() {
        let spec: OrderSpec =
            serde_json::from_str(r#"{"side":"BUY","order_type":"MARKET","quantity":"100"}"#)
                .unwrap();
        assert_eq!(spec.time_in_force, TimeInForce::Day);
        assert!(!spec.extended_hours);
        assert!(spec.limit_price.is_none());
    }
}
