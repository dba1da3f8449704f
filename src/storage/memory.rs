//! In-process store evaluator
//!
//! Applies the pure algorithms to a keyed bucket table under a per-key
//! mutex. Serves single-process deployments and doubles as the reference
//! oracle the Redis scripts are checked against.

use crate::core::algorithms::{self, BucketState};
use crate::core::policy::Policy;
use crate::storage::{EvaluatorResult, StoreEvaluator};
use crate::utils::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

/// Keyed in-memory bucket store
#[derive(Default)]
pub struct MemoryEvaluator {
    buckets: DashMap<String, Mutex<BucketState>>,
}

impl MemoryEvaluator {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live buckets (test observability)
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[async_trait]
impl StoreEvaluator for MemoryEvaluator {
    async fn evaluate(
        &self,
        key: &str,
        policy: &Policy,
        now_ticks: i64,
        requested_tokens: u32,
    ) -> Result<EvaluatorResult> {
        let entry = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(BucketState::uninitialized(policy.algorithm)));

        // The per-key mutex serialises concurrent evaluations of one bucket,
        // matching the serialisability the store script provides.
        let mut state = entry.lock();
        let (new_state, computation) =
            algorithms::evaluate(*state, policy, now_ticks, requested_tokens)?;
        *state = new_state;

        Ok(EvaluatorResult {
            allowed: computation.allowed,
            remaining: computation.remaining,
            retry_after_ticks: computation.retry_after_ticks,
            reset_after_ticks: computation.reset_after_ticks,
            used_this_call: computation.used_this_call,
            evaluated_at_ticks: now_ticks,
        })
    }
}
