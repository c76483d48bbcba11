//! Capacity Oracle Port (Driven Port)
//!
//! Answers "how much buying power is available right now?" by asking the
//! broker. Implementations never cache: every call is a fresh query.

use async_trait::async_trait;

use crate::domain::admission::CapacitySnapshot;

/// Capacity oracle error.
///
/// Both variants are fatal to the remainder of an admission cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The request did not complete.
    #[error("Capacity oracle transport error: {message}")]
    Transport {
        /// Error details.
        message: String,
    },

    /// The broker answered with something that is not a capacity figure.
    #[error("Capacity oracle returned a malformed response: {message}")]
    MalformedResponse {
        /// Error details.
        message: String,
    },
}

/// Port for fetching the currently available capacity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CapacityOraclePort: Send + Sync {
    /// Fetch the current available capacity, timestamped at retrieval.
    async fn fetch_capacity(&self) -> Result<CapacitySnapshot, OracleError>;
}
