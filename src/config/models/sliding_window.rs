//! Sliding-window counter configuration

use super::{default_true, default_window_buckets, default_window_secs};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the per-policy observability counters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlidingWindowConfig {
    /// Span of the observability window in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Number of ring buckets; must be greater than 1
    #[serde(default = "default_window_buckets")]
    pub buckets: u32,
    /// Gate for counter updates
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            buckets: default_window_buckets(),
            enabled: true,
        }
    }
}

impl SlidingWindowConfig {
    /// Window span as a duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Merge sliding-window configurations (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if other.window_secs != default_window_secs() {
            self.window_secs = other.window_secs;
        }
        if other.buckets != default_window_buckets() {
            self.buckets = other.buckets;
        }
        self.enabled = other.enabled;
        self
    }
}
