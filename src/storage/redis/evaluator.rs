//! Atomic store evaluator backed by Redis
//!
//! One script invocation per decision. Store failures never reach the
//! caller: the evaluator logs and fails open, admitting the request with a
//! full bucket's worth of remaining capacity.

use super::pool::RedisPool;
use super::scripts::{LEAKY_BUCKET_SCRIPT, TOKEN_BUCKET_SCRIPT};
use crate::config::models::RedisConfig;
use crate::core::policy::{Algorithm, Policy};
use crate::storage::{EvaluatorResult, StoreEvaluator};
use crate::utils::error::{LimiterError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Redis-backed atomic evaluator
pub struct RedisEvaluator {
    pool: RedisPool,
    key_prefix: String,
    key_ttl: Duration,
}

impl RedisEvaluator {
    /// Create an evaluator over an existing pool
    pub fn new(pool: RedisPool, config: &RedisConfig) -> Self {
        Self {
            pool,
            key_prefix: config.key_prefix.clone(),
            key_ttl: config.key_ttl(),
        }
    }

    fn prefixed_key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }

    fn ttl_seconds(&self) -> u64 {
        self.key_ttl.as_secs().max(1)
    }

    /// The availability-over-strictness decision: admit with full capacity
    fn fail_open_result(policy: &Policy, now_ticks: i64) -> EvaluatorResult {
        EvaluatorResult {
            allowed: true,
            remaining: policy.burst_capacity() as f64,
            retry_after_ticks: 0,
            reset_after_ticks: policy.precision_ticks(),
            used_this_call: 0.0,
            evaluated_at_ticks: now_ticks,
        }
    }

    async fn run_script(
        &self,
        key: &str,
        policy: &Policy,
        now_ticks: i64,
        requested_tokens: u32,
    ) -> Result<EvaluatorResult> {
        let mut conn = self.pool.connection().ok_or_else(|| {
            LimiterError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "no store connection",
            )))
        })?;

        let script = match policy.algorithm {
            Algorithm::TokenBucket => &*TOKEN_BUCKET_SCRIPT,
            Algorithm::LeakyBucket => &*LEAKY_BUCKET_SCRIPT,
        };

        let (allowed, state_value, evaluated_at, retry_after, reset_after, used): (
            i64,
            String,
            i64,
            i64,
            i64,
            i64,
        ) = script
            .key(self.prefixed_key(key))
            .arg(now_ticks)
            .arg(policy.permit_limit)
            .arg(policy.window_ticks())
            .arg(policy.burst_capacity())
            .arg(policy.precision_ticks())
            .arg(requested_tokens)
            .arg(self.ttl_seconds())
            .arg(policy.cooldown_ticks())
            .invoke_async(&mut conn)
            .await
            .map_err(LimiterError::Redis)?;

        let state_value: f64 = state_value.parse().map_err(|_| {
            LimiterError::Redis(redis::RedisError::from((
                redis::ErrorKind::TypeError,
                "unparseable state from script",
            )))
        })?;

        let burst = policy.burst_capacity() as f64;
        let remaining = match policy.algorithm {
            Algorithm::TokenBucket => state_value.max(0.0),
            Algorithm::LeakyBucket => (burst - state_value).max(0.0),
        };

        Ok(EvaluatorResult {
            allowed: allowed == 1,
            remaining,
            retry_after_ticks: retry_after,
            reset_after_ticks: reset_after,
            used_this_call: used as f64,
            evaluated_at_ticks: evaluated_at,
        })
    }
}

#[async_trait]
impl StoreEvaluator for RedisEvaluator {
    async fn evaluate(
        &self,
        key: &str,
        policy: &Policy,
        now_ticks: i64,
        requested_tokens: u32,
    ) -> Result<EvaluatorResult> {
        if self.pool.is_noop() {
            debug!(policy = %policy.name, "store in no-op mode, failing open");
            return Ok(Self::fail_open_result(policy, now_ticks));
        }

        match self
            .run_script(key, policy, now_ticks, requested_tokens)
            .await
        {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(policy = %policy.name, error = %e, "store evaluation failed, failing open");
                Ok(Self::fail_open_result(policy, now_ticks))
            }
        }
    }
}
