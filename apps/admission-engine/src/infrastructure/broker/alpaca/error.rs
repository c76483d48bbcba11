//! Alpaca-specific error types.

use thiserror::Error;

use crate::application::ports::{GatewayError, OracleError};

/// Errors from the Alpaca adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlpacaError {
    /// The HTTP client could not be built.
    #[error("HTTP error: {0}")]
    Http(String),

    /// API returned a non-success status.
    #[error("API error {status}: {code} - {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Error code from the API.
        code: String,
        /// Error message from the API.
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Suggested retry delay in seconds.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("Network error: {0}")]
    Network(String),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Max retries exceeded.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Last failure seen.
        last_error: String,
    },
}

impl AlpacaError {
    /// Returns true if the broker refused the order for lack of buying power.
    #[must_use]
    pub fn is_insufficient_buying_power(&self) -> bool {
        match self {
            Self::Api { code, message, .. } => {
                code == INSUFFICIENT_BUYING_POWER_CODE
                    || message.to_lowercase().contains("insufficient buying power")
            }
            _ => false,
        }
    }
}

/// Alpaca error code for an order exceeding buying power.
pub const INSUFFICIENT_BUYING_POWER_CODE: &str = "40310000";

impl From<AlpacaError> for OracleError {
    fn from(err: AlpacaError) -> Self {
        match err {
            AlpacaError::JsonParse(message) => Self::MalformedResponse { message },
            other => Self::Transport {
                message: other.to_string(),
            },
        }
    }
}

impl From<AlpacaError> for GatewayError {
    fn from(err: AlpacaError) -> Self {
        match err {
            AlpacaError::Network(message) => Self::Transport { message },
            AlpacaError::JsonParse(message) => Self::Ambiguous { message },
            AlpacaError::Api {
                status,
                code,
                message,
            } if status >= 500 => Self::Ambiguous {
                message: format!("HTTP {status}: {code} - {message}"),
            },
            other => Self::Unexpected {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: &str, message: &str) -> AlpacaError {
        AlpacaError::Api {
            status,
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn insufficient_buying_power_by_code_or_message() {
        assert!(api(403, "40310000", "forbidden").is_insufficient_buying_power());
        assert!(api(403, "403", "Insufficient buying power").is_insufficient_buying_power());
        assert!(!api(403, "40010001", "account is not authorized").is_insufficient_buying_power());
        assert!(!AlpacaError::AuthenticationFailed.is_insufficient_buying_power());
    }

    #[test]
    fn oracle_error_from_parse_failure_is_malformed() {
        let err: OracleError = AlpacaError::JsonParse("missing field".to_string()).into();
        assert!(matches!(err, OracleError::MalformedResponse { .. }));
    }

    #[test]
    fn oracle_error_from_network_is_transport() {
        let err: OracleError = AlpacaError::MaxRetriesExceeded {
            attempts: 3,
            last_error: "503".to_string(),
        }
        .into();
        assert!(matches!(err, OracleError::Transport { .. }));
    }

    #[test]
    fn gateway_error_mapping() {
        assert!(matches!(
            GatewayError::from(AlpacaError::Network("timeout".to_string())),
            GatewayError::Transport { .. }
        ));
        assert!(matches!(
            GatewayError::from(AlpacaError::JsonParse("eof".to_string())),
            GatewayError::Ambiguous { .. }
        ));
        assert!(matches!(
            GatewayError::from(api(502, "502", "bad gateway")),
            GatewayError::Ambiguous { .. }
        ));
        assert!(matches!(
            GatewayError::from(AlpacaError::Http("tls".to_string())),
            GatewayError::Unexpected { .. }
        ));
    }
}
