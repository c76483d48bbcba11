//! Application Layer
//!
//! The application layer orchestrates domain logic through use cases.
//! It defines:
//!
//! - **Ports**: Interfaces for interacting with the broker, reporting and time
//! - **Use Cases**: The admission loop and cycle reporting
//! - **DTOs**: Candidate batch input and scalar reporting records

pub mod dto;
pub mod ports;
pub mod use_cases;

pub use dto::*;
pub use ports::*;
pub use use_cases::*;
