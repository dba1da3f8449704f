//! Inline policy configuration

use super::{default_precision_ms, default_tokens_per_request};
use crate::core::policy::{Algorithm, Policy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A rate-limit policy as it appears in static configuration
///
/// Converted into a [`Policy`] at cache refresh; invalid entries are skipped
/// with an error log rather than aborting the refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
    /// Unique policy name (looked up case-insensitively)
    pub name: String,
    /// Bucket algorithm
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Steady-state permits per window
    pub permit_limit: u32,
    /// Enforcement window in milliseconds
    pub window_ms: u64,
    /// Maximum instantaneous capacity; resolves to `permit_limit` when unset
    /// or zero
    #[serde(default)]
    pub burst_limit: Option<u32>,
    /// Minimum retry/reset granularity in milliseconds
    #[serde(default = "default_precision_ms")]
    pub precision_ms: u64,
    /// Optional deny cooldown in milliseconds
    #[serde(default)]
    pub cooldown_ms: Option<u64>,
    /// Token cost multiplier per request
    #[serde(default = "default_tokens_per_request")]
    pub tokens_per_request: u32,
    /// Whether this policy feeds a sliding-window counter
    #[serde(default)]
    pub sliding_window_metrics: bool,
}

impl PolicyConfig {
    /// Convert into the immutable domain policy
    pub fn to_policy(&self) -> Policy {
        Policy {
            name: self.name.clone(),
            algorithm: self.algorithm,
            permit_limit: self.permit_limit,
            window: Duration::from_millis(self.window_ms),
            burst_limit: self.burst_limit,
            precision: Duration::from_millis(self.precision_ms),
            cooldown: self.cooldown_ms.map(Duration::from_millis),
            tokens_per_request: self.tokens_per_request,
            sliding_window_metrics: self.sliding_window_metrics,
        }
    }
}
