//! Bucket-state storage
//!
//! The decision path talks to shared state through [`StoreEvaluator`]: one
//! atomic read-compute-write per decision. The Redis implementation executes
//! the algorithms server-side as Lua scripts; the in-memory implementation
//! applies the same pure functions under a per-key mutex and serves as
//! single-process mode and as the reference oracle in tests.

pub mod memory;
pub mod redis;

pub use memory::MemoryEvaluator;
pub use redis::{RedisEvaluator, RedisPool};

use crate::core::policy::Policy;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Outcome of one atomic store evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluatorResult {
    /// Whether the request was admitted
    pub allowed: bool,
    /// Capacity still available after the evaluation
    pub remaining: f64,
    /// Ticks the caller should wait before retrying; zero iff allowed
    pub retry_after_ticks: i64,
    /// Ticks until the bucket returns to its idle state
    pub reset_after_ticks: i64,
    /// Tokens consumed by this call (zero on deny)
    pub used_this_call: f64,
    /// Tick at which the evaluation ran
    pub evaluated_at_ticks: i64,
}

/// Atomic evaluation of a request against shared bucket state
///
/// Implementations guarantee that the read of current state, the computation
/// and the write-back are serialisable with respect to any concurrent
/// evaluation of the same key.
#[async_trait]
pub trait StoreEvaluator: Send + Sync {
    /// Evaluate `requested_tokens` against the bucket at `key`
    async fn evaluate(
        &self,
        key: &str,
        policy: &Policy,
        now_ticks: i64,
        requested_tokens: u32,
    ) -> Result<EvaluatorResult>;
}
