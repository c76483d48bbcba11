//! Symbol value object for instrument identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// Longest symbol accepted (OCC option symbols are up to 21 characters).
const MAX_SYMBOL_LEN: usize = 21;

/// A trading symbol (ticker or OCC option symbol), normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate the symbol for order submission.
    ///
    /// # Errors
    ///
    /// Returns error if symbol is empty, too long, or contains invalid characters.
    pub fn validate(&self) -> Result<(), DomainError> {
        let message = if self.0.is_empty() {
            "Symbol cannot be empty"
        } else if self.0.len() > MAX_SYMBOL_LEN {
            "Symbol exceeds maximum length"
        } else if !self.0.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            "Symbol contains invalid characters"
        } else {
            return Ok(());
        };

        Err(DomainError::InvalidValue {
            field: "symbol".to_string(),
            message: message.to_string(),
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(Symbol::new(" aapl ").as_str(), "AAPL");
    }

    #[test]
    fn validate_rejects_bad_symbols() {
        assert!(Symbol::new("").validate().is_err());
        assert!(Symbol::new("A".repeat(25)).validate().is_err());
        assert!(Symbol::new("AA PL").validate().is_err());
        assert!(Symbol::new("AAPL!").validate().is_err());
    }

    #[test]
    fn validate_accepts_equities_and_options() {
        assert!(Symbol::new("AAPL").validate().is_ok());
        assert!(Symbol::new("BRK.B").validate().is_ok());
        assert!(Symbol::new("AAPL250117P00190000").validate().is_ok());
    }
}
