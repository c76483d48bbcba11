//! Domain errors for the admission engine.

use std::fmt;

/// Domain-level errors that can occur in business logic.
///
/// These errors are independent of infrastructure concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid value for a field.
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Business rule violation.
    BusinessRuleViolation {
        /// Rule name or code.
        rule: String,
        /// Description of the violation.
        message: String,
    },

    /// Aggregate invariant violated.
    InvariantViolation {
        /// Aggregate type.
        aggregate: String,
        /// Invariant that was violated.
        invariant: String,
        /// Current state description.
        state: String,
    },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{field}': {message}")
            }
            Self::BusinessRuleViolation { rule, message } => {
                write!(f, "Business rule '{rule}' violated: {message}")
            }
            Self::InvariantViolation {
                aggregate,
                invariant,
                state,
            } => {
                write!(
                    f,
                    "Invariant violation in {aggregate}: {invariant} (state: {state})"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}
