//! Sliding-window observability counter
//!
//! A ring of time-striped buckets producing (hits, rate) samples. Updates and
//! snapshots are lock-free: bucket starts and values live in atomics with
//! acquire/release ordering, and value accumulation runs a CAS loop that only
//! retries under contention.

#[cfg(test)]
mod tests;

use crate::core::types::SlidingWindowSample;
use crate::utils::clock::{duration_to_ticks, TICKS_PER_SECOND};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// One ring slot
///
/// A snapshot taken between the epoch swap and the value reset may observe a
/// stale value under the new start; samples may be attributed to the adjacent
/// bucket under tick skew, which the observability contract tolerates.
struct WindowBucket {
    start_ticks: AtomicI64,
    value_bits: AtomicU64,
}

impl WindowBucket {
    fn new() -> Self {
        Self {
            start_ticks: AtomicI64::new(0),
            value_bits: AtomicU64::new(0f64.to_bits()),
        }
    }
}

/// Lock-free sliding-window counter over a fixed ring of buckets
pub struct SlidingWindowCounter {
    window_ticks: i64,
    bucket_duration_ticks: i64,
    buckets: Box<[WindowBucket]>,
}

impl SlidingWindowCounter {
    /// Create a counter spanning `window` across `buckets` ring slots
    pub fn new(window: Duration, buckets: u32) -> Self {
        let bucket_count = buckets.max(2) as usize;
        let window_ticks = duration_to_ticks(window).max(1);
        let bucket_duration_ticks = (window_ticks / bucket_count as i64).max(1);

        Self {
            window_ticks,
            bucket_duration_ticks,
            buckets: (0..bucket_count).map(|_| WindowBucket::new()).collect(),
        }
    }

    /// Span of the observability window
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ticks as u64)
    }

    fn bucket_index(&self, ticks: i64) -> usize {
        ticks
            .div_euclid(self.bucket_duration_ticks)
            .rem_euclid(self.buckets.len() as i64) as usize
    }

    fn bucket_start(&self, ticks: i64) -> i64 {
        ticks - ticks.rem_euclid(self.bucket_duration_ticks)
    }

    /// Accumulate `value` into the bucket covering `now_ticks`
    pub fn add_sample(&self, now_ticks: i64, value: f64) {
        let bucket = &self.buckets[self.bucket_index(now_ticks)];
        let start = self.bucket_start(now_ticks);

        // On epoch change exactly one updater wins the swap and zeroes the
        // stale value; the rest fall through to the accumulate loop.
        let observed = bucket.start_ticks.load(Ordering::Acquire);
        if observed != start
            && bucket
                .start_ticks
                .compare_exchange(observed, start, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            bucket.value_bits.store(0f64.to_bits(), Ordering::Release);
        }

        let mut current = bucket.value_bits.load(Ordering::Acquire);
        loop {
            let next = (f64::from_bits(current) + value).to_bits();
            match bucket.value_bits.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    /// Sum the buckets still inside the window ending at `now_ticks`
    pub fn snapshot(&self, now_ticks: i64) -> SlidingWindowSample {
        let cutoff = now_ticks - self.window_ticks;
        let mut hits = 0.0;

        for bucket in self.buckets.iter() {
            if bucket.start_ticks.load(Ordering::Acquire) >= cutoff {
                hits += f64::from_bits(bucket.value_bits.load(Ordering::Acquire));
            }
        }

        let window_seconds = self.window_ticks as f64 / TICKS_PER_SECOND as f64;
        SlidingWindowSample {
            window: self.window(),
            hits,
            rate_per_second: hits / window_seconds,
        }
    }
}
