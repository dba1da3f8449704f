//! Configuration validation
//!
//! Validation logic for all configuration structures. Policy-level rules live
//! with the domain type in [`crate::core::policy`]; this module covers the
//! infrastructure settings.

use crate::config::models::{LimiterConfig, PolicyConfig, RedisConfig, SlidingWindowConfig};

/// Validation trait for configuration structures
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl Validate for RedisConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.url.is_empty() {
            return Err("Redis URL must not be empty".to_string());
        }

        if self.key_prefix.is_empty() {
            return Err("Redis key prefix must not be empty".to_string());
        }

        if self.key_ttl_secs < 10 {
            return Err("Redis key TTL must be at least 10 seconds".to_string());
        }

        Ok(())
    }
}

impl Validate for SlidingWindowConfig {
    fn validate(&self) -> Result<(), String> {
        if self.window_secs == 0 {
            return Err("Sliding window span must be greater than 0".to_string());
        }

        if self.buckets <= 1 {
            return Err("Sliding window bucket count must be greater than 1".to_string());
        }

        Ok(())
    }
}

impl Validate for PolicyConfig {
    fn validate(&self) -> Result<(), String> {
        self.to_policy().validate()
    }
}

impl Validate for LimiterConfig {
    fn validate(&self) -> Result<(), String> {
        self.redis.validate()?;
        self.sliding_window.validate()?;

        // Inline policies are validated again at refresh, where a bad entry
        // is skipped instead of failing; here a bad entry is a startup error.
        for policy in &self.policies {
            policy
                .validate()
                .map_err(|e| format!("policy '{}': {}", policy.name, e))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config_rejects_empty_prefix() {
        let config = RedisConfig {
            key_prefix: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redis_config_rejects_short_ttl() {
        let config = RedisConfig {
            key_ttl_secs: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sliding_window_needs_multiple_buckets() {
        let config = SlidingWindowConfig {
            buckets: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SlidingWindowConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_limiter_config_defaults_validate() {
        assert!(LimiterConfig::default().validate().is_ok());
    }
}
