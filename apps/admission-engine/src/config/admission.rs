//! Admission cycle configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::use_cases::AdmissionPolicy;
use crate::domain::shared::Money;

use super::default_true;

/// Admission configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Cancel the cycle after this many seconds.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
    /// Buying power kept unspent.
    #[serde(default)]
    pub capacity_reserve: Decimal,
    /// Fetch a closing snapshot after the last candidate.
    #[serde(default = "default_true")]
    pub final_snapshot: bool,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            deadline_secs: None,
            capacity_reserve: Decimal::ZERO,
            final_snapshot: true,
        }
    }
}

impl AdmissionConfig {
    /// The controller policy.
    #[must_use]
    pub const fn policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            capacity_reserve: Money::new(self.capacity_reserve),
            final_snapshot: self.final_snapshot,
        }
    }

    /// The cycle deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}
