//! Policy value objects
//!
//! A [`Policy`] is an immutable description of one rate limit. Policies are
//! owned by the cache and replaced wholesale at refresh; nothing mutates them
//! in place.

use crate::utils::clock::duration_to_ticks;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bucket algorithm selector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Tokens refill continuously; requests drain them
    #[default]
    TokenBucket,
    /// Requests fill the bucket; water drains continuously
    LeakyBucket,
}

/// An immutable rate-limit policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    /// Unique name, looked up case-insensitively
    pub name: String,
    /// Bucket algorithm
    pub algorithm: Algorithm,
    /// Steady-state permits per window
    pub permit_limit: u32,
    /// Enforcement window
    pub window: Duration,
    /// Maximum instantaneous capacity; unset or zero resolves to `permit_limit`
    pub burst_limit: Option<u32>,
    /// Minimum retry/reset granularity
    pub precision: Duration,
    /// Optional deny cooldown extending retry-after
    pub cooldown: Option<Duration>,
    /// Token cost multiplier per request
    pub tokens_per_request: u32,
    /// Whether decisions against this policy feed a sliding-window counter
    pub sliding_window_metrics: bool,
}

impl Policy {
    /// Resolved burst capacity: `max(burst_limit, permit_limit)`, with an
    /// unset or zero `burst_limit` treated as absent
    pub fn burst_capacity(&self) -> u32 {
        match self.burst_limit {
            Some(burst) if burst > 0 => burst.max(self.permit_limit),
            _ => self.permit_limit,
        }
    }

    /// Enforcement window in ticks
    pub fn window_ticks(&self) -> i64 {
        duration_to_ticks(self.window)
    }

    /// Retry/reset granularity in ticks
    pub fn precision_ticks(&self) -> i64 {
        duration_to_ticks(self.precision)
    }

    /// Cooldown in ticks, zero when unset
    pub fn cooldown_ticks(&self) -> i64 {
        self.cooldown.map(duration_to_ticks).unwrap_or(0)
    }

    /// Validate the policy definition
    ///
    /// Validation is idempotent and side-effect free; callers map the message
    /// into the error kind appropriate to their context (configuration load
    /// versus request evaluation).
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("policy name must not be empty".to_string());
        }

        if self.permit_limit == 0 {
            return Err("permit limit must be greater than 0".to_string());
        }

        if self.window.is_zero() {
            return Err("window must be greater than 0".to_string());
        }

        if self.precision.is_zero() {
            return Err("precision must be greater than 0".to_string());
        }

        if let Some(cooldown) = self.cooldown {
            if cooldown.is_zero() {
                return Err("cooldown must be greater than 0 when set".to_string());
            }
        }

        if self.tokens_per_request == 0 {
            return Err("tokens per request must be greater than 0".to_string());
        }

        Ok(())
    }
}
