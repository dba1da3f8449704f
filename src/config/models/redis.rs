//! Shared-store configuration

use super::{default_key_prefix, default_key_ttl_secs, default_redis_url, default_true};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Redis configuration for the shared bucket store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedisConfig {
    /// Connection string (redis:// or rediss://)
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Global namespace prefix applied to every composed key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// TTL applied after each bucket update, in seconds
    #[serde(default = "default_key_ttl_secs")]
    pub key_ttl_secs: u64,
    /// Logical database selector; uses the URL's database when unset
    #[serde(default)]
    pub database: Option<i64>,
    /// Whether the shared store is used at all; when false the service runs
    /// on the in-process evaluator
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
            key_ttl_secs: default_key_ttl_secs(),
            database: None,
            enabled: true,
        }
    }
}

impl RedisConfig {
    /// TTL as a duration
    pub fn key_ttl(&self) -> Duration {
        Duration::from_secs(self.key_ttl_secs)
    }

    /// Merge Redis configurations (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if other.url != default_redis_url() {
            self.url = other.url;
        }
        if other.key_prefix != default_key_prefix() {
            self.key_prefix = other.key_prefix;
        }
        if other.key_ttl_secs != default_key_ttl_secs() {
            self.key_ttl_secs = other.key_ttl_secs;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        self.enabled = other.enabled;
        self
    }
}
