//! # Ratekeeper
//!
//! A distributed rate-limiting decision engine. A horizontally scaled fleet
//! of front-ends shares bucket state in Redis, so every instance enforces
//! one global quota per (policy, caller-identity) pair.
//!
//! ## Features
//!
//! - **Token and leaky bucket** policies evaluated as pure functions and
//!   executed atomically server-side as Lua scripts
//! - **Fail-open**: store trouble admits requests instead of failing them
//! - **Policy cache** merging static configuration with a policy repository,
//!   refreshed on a timer and on configuration change
//! - **Sliding-window counters** producing lock-free (hits, rate) samples
//!   per policy
//! - **Single-process mode** via the in-memory evaluator, which doubles as
//!   the reference oracle the scripts are tested against
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ratekeeper::{Identity, LimiterConfig, RateLimitRequest, RateLimitService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config: LimiterConfig = serde_yaml::from_str(
//!         r#"
//! redis:
//!   url: "redis://127.0.0.1:6379"
//!   key_prefix: "rk"
//! policies:
//!   - name: "api-default"
//!     permit_limit: 100
//!     window_ms: 60000
//! "#,
//!     )?;
//!
//!     let service = RateLimitService::builder(config).build().await?;
//!
//!     let request = RateLimitRequest::new("api-default", Identity::from_api_key("key-1"));
//!     match service.should_allow(&request).await? {
//!         Some(decision) if decision.allowed => println!("allowed"),
//!         Some(decision) => println!("denied, retry after {:?}", decision.retry_after),
//!         None => println!("no policy, passing through"),
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod audit;
pub mod config;
pub mod core;
pub mod repository;
pub mod storage;
pub mod utils;

// Re-export the decision surface
pub use crate::config::{Config, LimiterConfig, PolicyConfig, RedisConfig, SlidingWindowConfig};
pub use crate::core::{
    Algorithm, Counters, Decision, Identity, Policy, PolicyCache, RateLimitRequest,
    RateLimitService, RateLimitServiceBuilder, SlidingWindowCounter, SlidingWindowSample,
};
pub use crate::storage::{
    EvaluatorResult, MemoryEvaluator, RedisEvaluator, RedisPool, StoreEvaluator,
};
pub use crate::utils::error::{LimiterError, Result};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
