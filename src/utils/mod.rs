//! Utility modules for the rate limiter

pub mod clock;
pub mod error;

pub use clock::{duration_to_ticks, ticks_to_duration, SystemTimeSource, TimeSource};
pub use error::{LimiterError, Result};
