//! Bucket algorithms
//!
//! Pure, deterministic evaluation functions over opaque per-bucket state.
//! These never consult global state; they are reusable outside the store for
//! single-process mode and double as the reference oracle the store scripts
//! are tested against.

mod leaky_bucket;
mod token_bucket;
mod types;


pub use types::{BucketState, Computation};

use crate::core::policy::{Algorithm, Policy};
use crate::utils::error::Result;

/// Evaluate one request against a policy's bucket state
///
/// Dispatches to the policy's algorithm. State carried over from a different
/// algorithm (a policy whose algorithm changed under a live key) is treated
/// as uninitialised.
pub fn evaluate(
    state: BucketState,
    policy: &Policy,
    now_ticks: i64,
    requested_tokens: u32,
) -> Result<(BucketState, Computation)> {
    match policy.algorithm {
        Algorithm::TokenBucket => token_bucket::evaluate(state, policy, now_ticks, requested_tokens),
        Algorithm::LeakyBucket => leaky_bucket::evaluate(state, policy, now_ticks, requested_tokens),
    }
}
