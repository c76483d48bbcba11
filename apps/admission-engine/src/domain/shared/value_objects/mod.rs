//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod identifiers;
mod money;
mod symbol;
mod timestamp;

pub use identifiers::{BrokerId, CandidateId, CycleId, OrderId};
pub use money::Money;
pub use symbol::Symbol;
pub use timestamp::Timestamp;
