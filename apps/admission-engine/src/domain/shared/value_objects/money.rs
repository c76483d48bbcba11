//! Money value object for buying power and capacity costs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

use crate::domain::shared::DomainError;

/// A monetary amount in USD.
///
/// Represented as a Decimal so that capacity comparisons are exact.
/// Displayed with 2 decimal places (internal precision is higher).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Money value from a Decimal.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a Money value from whole dollars.
    #[must_use]
    pub fn dollars(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }

    /// Create a Money value from cents (integer).
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Get the inner Decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if this amount is positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if this amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Add, or `None` if the sum does not fit a Decimal.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Add, clamping at the largest representable amount.
    #[must_use]
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Subtract, flooring at zero.
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0).max(Decimal::ZERO))
    }

    /// Multiply a quantity by a unit price, or `None` on overflow.
    #[must_use]
    pub fn checked_cost(quantity: Decimal, price: Decimal) -> Option<Self> {
        quantity.checked_mul(price).map(Self)
    }

    /// Validate an amount used as a capacity cost.
    ///
    /// # Errors
    ///
    /// Returns error if the amount is zero or negative.
    pub fn validate_as_cost(&self, field: &str) -> Result<(), DomainError> {
        if !self.is_positive() {
            return Err(DomainError::InvalidValue {
                field: field.to_string(),
                message: format!("capacity cost must be positive, got {self}"),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

/// Saturates at `Decimal::MAX` instead of overflowing.
impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}
