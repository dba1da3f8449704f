//! Algorithm state and result types

use crate::core::policy::Algorithm;

/// Opaque per-bucket state advanced by an algorithm over time
///
/// A tick count of zero in the `last_*` field marks the state as
/// uninitialised; the algorithm's initialisation branch runs on first
/// contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BucketState {
    /// Token-bucket state
    TokenBucket {
        /// Tokens currently available
        tokens: f64,
        /// Tick of the last refill, 0 when uninitialised
        last_refill_ticks: i64,
    },
    /// Leaky-bucket state
    LeakyBucket {
        /// Current water level
        water_level: f64,
        /// Tick of the last drip, 0 when uninitialised
        last_drip_ticks: i64,
    },
}

impl BucketState {
    /// Fresh uninitialised state for the given algorithm
    pub fn uninitialized(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::TokenBucket => BucketState::TokenBucket {
                tokens: 0.0,
                last_refill_ticks: 0,
            },
            Algorithm::LeakyBucket => BucketState::LeakyBucket {
                water_level: 0.0,
                last_drip_ticks: 0,
            },
        }
    }
}

/// Outcome of one algorithm evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Computation {
    /// Whether the request was admitted
    pub allowed: bool,
    /// Ticks the caller should wait before retrying; zero iff allowed
    pub retry_after_ticks: i64,
    /// Ticks until the bucket returns to its idle state
    pub reset_after_ticks: i64,
    /// Tokens consumed by this call (zero on deny)
    pub used_this_call: f64,
    /// Capacity still available after this evaluation
    pub remaining: f64,
}
