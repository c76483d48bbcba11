//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Services**: Stateless or single-cycle business logic
//!
//! # Bounded Contexts
//!
//! - [`admission`]: Candidates, capacity snapshots, outcomes and cycle summaries
//! - [`order`]: The order specification handed to the broker untouched
//! - [`shared`]: Money, symbols, timestamps and identifiers

pub mod admission;
pub mod order;
pub mod shared;
