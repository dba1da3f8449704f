//! Configuration data models
//!
//! This module defines all configuration structures used by the rate limiter.

pub mod limiter;
pub mod policy;
pub mod redis;
pub mod sliding_window;

// Re-export all configuration types
pub use limiter::*;
pub use policy::*;
pub use redis::*;
pub use sliding_window::*;

/// Default Redis endpoint
pub fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

/// Default global key prefix
pub fn default_key_prefix() -> String {
    "ratekeeper".to_string()
}

/// Default per-key TTL in seconds
pub fn default_key_ttl_secs() -> u64 {
    60
}

/// Default policy refresh period in seconds
pub fn default_reload_interval_secs() -> i64 {
    30
}

/// Default retry/reset granularity in milliseconds
pub fn default_precision_ms() -> u64 {
    1_000
}

/// Default token cost per request
pub fn default_tokens_per_request() -> u32 {
    1
}

/// Default sliding-window span in seconds
pub fn default_window_secs() -> u64 {
    60
}

/// Default sliding-window ring size
pub fn default_window_buckets() -> u32 {
    10
}

pub fn default_true() -> bool {
    true
}
