//! Configuration management for the rate limiter
//!
//! This module handles loading, validation, and change notification for the
//! limiter configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{LimiterError, Result};
use std::path::Path;
use tokio::sync::watch;
use tracing::{debug, info};

/// Main configuration struct for the rate limiter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Limiter configuration
    pub limiter: LimiterConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LimiterError::Config(format!("Failed to read config file: {}", e)))?;

        let limiter: LimiterConfig = serde_yaml::from_str(&content)
            .map_err(|e| LimiterError::Config(format!("Failed to parse config: {}", e)))?;

        let config = Self { limiter };
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Recognised variables: `RATEKEEPER_REDIS_URL`, `RATEKEEPER_KEY_PREFIX`,
    /// `RATEKEEPER_KEY_TTL_SECS`, `RATEKEEPER_REDIS_DATABASE`,
    /// `RATEKEEPER_RELOAD_INTERVAL_SECS`, `RATEKEEPER_AUDIT_ENABLED`,
    /// `RATEKEEPER_WARM_POLICIES`.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut limiter = LimiterConfig::default();

        if let Ok(url) = std::env::var("RATEKEEPER_REDIS_URL") {
            limiter.redis.url = url;
        }
        if let Ok(prefix) = std::env::var("RATEKEEPER_KEY_PREFIX") {
            limiter.redis.key_prefix = prefix;
        }
        if let Ok(ttl) = std::env::var("RATEKEEPER_KEY_TTL_SECS") {
            limiter.redis.key_ttl_secs = ttl
                .parse()
                .map_err(|e| LimiterError::Config(format!("Invalid key TTL: {}", e)))?;
        }
        if let Ok(db) = std::env::var("RATEKEEPER_REDIS_DATABASE") {
            limiter.redis.database = Some(
                db.parse()
                    .map_err(|e| LimiterError::Config(format!("Invalid database index: {}", e)))?,
            );
        }
        if let Ok(interval) = std::env::var("RATEKEEPER_RELOAD_INTERVAL_SECS") {
            limiter.policy_reload_interval_secs = interval
                .parse()
                .map_err(|e| LimiterError::Config(format!("Invalid reload interval: {}", e)))?;
        }
        if let Ok(audit) = std::env::var("RATEKEEPER_AUDIT_ENABLED") {
            limiter.audit_logging_enabled = audit == "true" || audit == "1";
        }
        if let Ok(warm) = std::env::var("RATEKEEPER_WARM_POLICIES") {
            limiter.warm_policies_on_startup = warm == "true" || warm == "1";
        }

        let config = Self { limiter };
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.limiter
            .validate()
            .map_err(LimiterError::Config)?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.limiter = self.limiter.merge(other.limiter);
        self
    }
}

/// Create a configuration change channel
///
/// The enclosing application holds the sender and publishes whenever its
/// configuration source changes; the policy cache subscribes through the
/// receiver. Delivery is strictly one-directional.
pub fn watch_channel(
    initial: LimiterConfig,
) -> (watch::Sender<LimiterConfig>, watch::Receiver<LimiterConfig>) {
    watch::channel(initial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r#"
redis:
  url: "redis://localhost:6379"
  key_prefix: "rk"
  key_ttl_secs: 30
policies:
  - name: "api-default"
    algorithm: token_bucket
    permit_limit: 100
    window_ms: 60000
    burst_limit: 200
policy_reload_interval_secs: 15
sliding_window:
  window_secs: 10
  buckets: 5
"#;
        let limiter: LimiterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(limiter.redis.key_prefix, "rk");
        assert_eq!(limiter.policies.len(), 1);
        assert_eq!(limiter.policies[0].permit_limit, 100);
        assert_eq!(limiter.policies[0].burst_limit, Some(200));
        assert_eq!(limiter.sliding_window.buckets, 5);
        assert!(Config { limiter }.validate().is_ok());
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = Config::default();
        let mut other = Config::default();
        other.limiter.redis.key_prefix = "override".to_string();
        other.limiter.policy_reload_interval_secs = -1;

        let merged = base.merge(other);
        assert_eq!(merged.limiter.redis.key_prefix, "override");
        assert!(merged.limiter.policy_reload_interval().is_none());
    }
}
