//! Decision surface types

use crate::core::identity::Identity;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A request to be admitted or rejected against a named policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitRequest {
    /// Policy name, resolved case-insensitively
    pub policy: String,
    /// Caller identity
    pub identity: Identity,
    /// Requested units; multiplied by the policy's tokens-per-request
    pub tokens: u32,
    /// Endpoint recorded in audit entries
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl RateLimitRequest {
    /// Single-unit request against a policy
    pub fn new(policy: impl Into<String>, identity: Identity) -> Self {
        Self {
            policy: policy.into(),
            identity,
            tokens: 1,
            endpoint: None,
        }
    }

    /// Override the requested units
    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.tokens = tokens;
        self
    }

    /// Attach the endpoint for audit entries
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Usage counters attached to every decision
///
/// `remaining + used` equals the policy's burst capacity after any
/// evaluation, within floating rounding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Counters {
    /// The policy's steady-state permit limit
    pub limit: u32,
    /// Capacity still available
    pub remaining: f64,
    /// Capacity outstanding in the current window
    pub used: f64,
    /// Time until the bucket returns to its idle state
    pub reset_after: Duration,
}

/// One observation from a policy's sliding-window counter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SlidingWindowSample {
    /// Span the sample covers
    pub window: Duration,
    /// Decisions observed within the window
    pub hits: f64,
    /// Observed decision rate
    pub rate_per_second: f64,
}

/// The outcome of evaluating one request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    /// Whether the request was admitted
    pub allowed: bool,
    /// Usage counters after this evaluation
    pub counters: Counters,
    /// Observability sample, when the policy has metrics enabled
    pub sliding_window: Option<SlidingWindowSample>,
    /// How long the caller should wait before retrying; zero iff allowed
    pub retry_after: Duration,
    /// Tick at which the evaluation ran
    pub evaluated_at_ticks: i64,
}
