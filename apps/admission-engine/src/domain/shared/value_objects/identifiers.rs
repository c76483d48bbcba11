//! Strongly-typed identifiers for domain entities.
//!
//! These prevent mixing a candidate's upstream id with the client order id
//! we hand to the broker, or with the id the broker hands back.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a new unique identifier using UUID v4.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is empty or whitespace.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(CandidateId, "Upstream identifier of a scored candidate.");
define_id!(CycleId, "Unique identifier for one admission cycle.");
define_id!(
    OrderId,
    "Client order id sent with a submission (broker-side idempotency key)."
);
define_id!(BrokerId, "Broker's unique identifier for an accepted order.");

impl OrderId {
    /// Client order id for submitting `candidate` within `cycle`.
    ///
    /// Name-based (UUID v5), so a replayed cycle reuses the same ids and the
    /// broker refuses a second submission of the same candidate.
    #[must_use]
    pub fn for_candidate(cycle: &CycleId, candidate: &CandidateId) -> Self {
        let name = format!("{}/{}", cycle.as_str(), candidate.as_str());
        Self(uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, name.as_bytes()).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_id_new_and_display() {
        let id = CandidateId::new("cand-7");
        assert_eq!(id.as_str(), "cand-7");
        assert_eq!(format!("{id}"), "cand-7");
    }

    #[test]
    fn order_id_generate_is_unique() {
        assert_ne!(OrderId::generate(), OrderId::generate());
    }

    #[test]
    fn order_id_for_candidate_is_stable() {
        let cycle = CycleId::new("cycle-1");
        let a = OrderId::for_candidate(&cycle, &CandidateId::new("a"));
        assert_eq!(a, OrderId::for_candidate(&cycle, &CandidateId::new("a")));
        assert_ne!(a, OrderId::for_candidate(&cycle, &CandidateId::new("b")));
        assert_ne!(
            a,
            OrderId::for_candidate(&CycleId::new("cycle-2"), &CandidateId::new("a"))
        );
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn blank_detection() {
        assert!(CandidateId::new("  ").is_blank());
        assert!(!CandidateId::new("c1").is_blank());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = CycleId::new("cycle-2026-10-19");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"cycle-2026-10-19\"");

        let parsed: CycleId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
