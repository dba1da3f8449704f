//! Root limiter configuration

use super::{default_reload_interval_secs, default_true, PolicyConfig, RedisConfig, SlidingWindowConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the rate limiter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimiterConfig {
    /// Shared-store configuration
    #[serde(default)]
    pub redis: RedisConfig,
    /// Inline policy definitions, merged with repository entries at refresh
    #[serde(default)]
    pub policies: Vec<PolicyConfig>,
    /// Policy refresh period in seconds; zero or negative disables the timer
    #[serde(default = "default_reload_interval_secs")]
    pub policy_reload_interval_secs: i64,
    /// Persist deny events to the audit sink
    #[serde(default)]
    pub audit_logging_enabled: bool,
    /// Observability counter settings
    #[serde(default)]
    pub sliding_window: SlidingWindowConfig,
    /// Block `initialize()` on the first refresh instead of warming lazily
    #[serde(default = "default_true")]
    pub warm_policies_on_startup: bool,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            policies: Vec::new(),
            policy_reload_interval_secs: default_reload_interval_secs(),
            audit_logging_enabled: false,
            sliding_window: SlidingWindowConfig::default(),
            warm_policies_on_startup: true,
        }
    }
}

impl LimiterConfig {
    /// Refresh period, `None` when the timer is disabled
    pub fn policy_reload_interval(&self) -> Option<Duration> {
        if self.policy_reload_interval_secs > 0 {
            Some(Duration::from_secs(self.policy_reload_interval_secs as u64))
        } else {
            None
        }
    }

    /// Merge limiter configurations (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.redis = self.redis.merge(other.redis);
        if !other.policies.is_empty() {
            self.policies = other.policies;
        }
        if other.policy_reload_interval_secs != default_reload_interval_secs() {
            self.policy_reload_interval_secs = other.policy_reload_interval_secs;
        }
        self.audit_logging_enabled = other.audit_logging_enabled;
        self.sliding_window = self.sliding_window.merge(other.sliding_window);
        self.warm_policies_on_startup = other.warm_policies_on_startup;
        self
    }
}
