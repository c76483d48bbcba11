//! Clock Port (Driven Port)
//!
//! Source of the timestamps stamped on outcomes and cycle boundaries.

use crate::domain::shared::Timestamp;

/// Port for reading the current time.
pub trait ClockPort: Send + Sync {
    /// Current time.
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
