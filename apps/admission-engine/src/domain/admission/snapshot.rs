//! Capacity snapshot value object.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, Timestamp};

/// Available buying power as reported by the broker at one instant.
///
/// Snapshots are transient: one per admission check, never reused for the
/// next candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacitySnapshot {
    available: Money,
    observed_at: Timestamp,
}

impl CapacitySnapshot {
    /// Create a snapshot.
    #[must_use]
    pub const fn new(available: Money, observed_at: Timestamp) -> Self {
        Self {
            available,
            observed_at,
        }
    }

    /// Available capacity reported by the broker.
    #[must_use]
    pub const fn available(&self) -> Money {
        self.available
    }

    /// When the broker was asked.
    #[must_use]
    pub const fn observed_at(&self) -> Timestamp {
        self.observed_at
    }

    /// Capacity left for admission after holding back `reserve`.
    #[must_use]
    pub fn admissible(&self, reserve: Money) -> Money {
        self.available.saturating_sub(reserve)
    }

    /// Returns true if `required` fits within the admissible capacity.
    #[must_use]
    pub fn fits(&self, required: Money, reserve: Money) -> bool {
        required <= self.admissible(reserve)
    }
}
