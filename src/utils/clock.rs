//! Tick arithmetic and the time source seam
//!
//! All bucket arithmetic runs on signed 64-bit tick counts with a fixed
//! resolution of one millisecond. Millisecond ticks stay well below 2^53, so
//! every tick value survives the round-trip through the store script's double
//! arithmetic exactly.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Ticks per second at the crate's fixed resolution (1 tick = 1 ms)
pub const TICKS_PER_SECOND: i64 = 1_000;

/// Convert a duration to ticks, saturating at `i64::MAX`
pub fn duration_to_ticks(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Convert a tick count to a duration; negative ticks clamp to zero
pub fn ticks_to_duration(ticks: i64) -> Duration {
    Duration::from_millis(ticks.max(0) as u64)
}

/// Source of the current tick count
///
/// Production callers use [`SystemTimeSource`]; tests drive a
/// [`ManualTimeSource`] so evaluation is deterministic.
pub trait TimeSource: Send + Sync {
    /// Current tick count
    fn now_ticks(&self) -> i64;
}

/// Wall-clock time source (milliseconds since the Unix epoch)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ticks(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }
}

/// Manually advanced time source for tests and simulations
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    ticks: AtomicI64,
}

impl ManualTimeSource {
    /// Create a manual source starting at the given tick
    pub fn new(start_ticks: i64) -> Self {
        Self {
            ticks: AtomicI64::new(start_ticks),
        }
    }

    /// Set the current tick
    pub fn set(&self, ticks: i64) {
        self.ticks.store(ticks, Ordering::Release);
    }

    /// Advance the clock by a duration
    pub fn advance(&self, by: Duration) {
        self.ticks.fetch_add(duration_to_ticks(by), Ordering::AcqRel);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ticks(&self) -> i64 {
        self.ticks.load(Ordering::Acquire)
    }
}
