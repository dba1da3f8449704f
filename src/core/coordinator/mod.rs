//! Decision coordinator
//!
//! Composes the cache, the store evaluator, the sliding-window counters and
//! the audit sink into the single entry point the enclosing middleware
//! calls: resolve the policy, evaluate atomically, count, decide.


use crate::audit::{AuditEntry, AuditSink};
use crate::config::models::LimiterConfig;
use crate::config::Validate;
use crate::core::cache::{PolicyCache, PolicySnapshot};
use crate::core::policy::Policy;
use crate::core::types::{Counters, Decision, RateLimitRequest};
use crate::core::window::SlidingWindowCounter;
use crate::repository::PolicyRepository;
use crate::storage::{MemoryEvaluator, RedisEvaluator, RedisPool, StoreEvaluator};
use crate::utils::clock::{ticks_to_duration, SystemTimeSource, TimeSource};
use crate::utils::error::{LimiterError, Result};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// The rate-limiting decision engine
pub struct RateLimitService {
    config: LimiterConfig,
    cache: Arc<PolicyCache>,
    evaluator: Arc<dyn StoreEvaluator>,
    windows: DashMap<String, Arc<SlidingWindowCounter>>,
    audit: Option<Arc<dyn AuditSink>>,
    clock: Arc<dyn TimeSource>,
}

impl RateLimitService {
    /// Start building a service over the given configuration
    pub fn builder(config: LimiterConfig) -> RateLimitServiceBuilder {
        RateLimitServiceBuilder {
            config,
            evaluator: None,
            repository: None,
            audit: None,
            clock: None,
            config_changes: None,
        }
    }

    /// Admit or reject one request
    ///
    /// Returns `None` when the policy is unknown; the middleware passes such
    /// requests through unrestricted. Fails only on validation errors; store
    /// trouble fails open inside the evaluator.
    pub async fn should_allow(&self, request: &RateLimitRequest) -> Result<Option<Decision>> {
        if request.tokens == 0 {
            return Err(LimiterError::Validation(
                "requested tokens must be at least 1".to_string(),
            ));
        }

        let Some(policy) = self.cache.get_policy(&request.policy) else {
            debug!(policy = %request.policy, "unknown policy, passing through");
            return Ok(None);
        };
        policy.validate().map_err(LimiterError::Validation)?;

        let burst = policy.burst_capacity();
        let cost = (policy.tokens_per_request as u64).saturating_mul(request.tokens as u64);
        let requested = cost.min(burst as u64) as u32;

        let key = request.identity.storage_key(&policy.name);
        let now_ticks = self.clock.now_ticks();
        let result = self
            .evaluator
            .evaluate(&key, &policy, now_ticks, requested)
            .await?;

        let sliding_window = if policy.sliding_window_metrics && self.config.sliding_window.enabled
        {
            let counter = self
                .windows
                .entry(policy.name.to_ascii_lowercase())
                .or_insert_with(|| {
                    Arc::new(SlidingWindowCounter::new(
                        self.config.sliding_window.window(),
                        self.config.sliding_window.buckets,
                    ))
                })
                .clone();
            counter.add_sample(now_ticks, 1.0);
            Some(counter.snapshot(now_ticks))
        } else {
            None
        };

        let burst = burst as f64;
        let decision = Decision {
            allowed: result.allowed,
            counters: Counters {
                limit: policy.permit_limit,
                remaining: result.remaining,
                used: (burst - result.remaining).max(0.0),
                reset_after: ticks_to_duration(result.reset_after_ticks),
            },
            sliding_window,
            retry_after: ticks_to_duration(result.retry_after_ticks),
            evaluated_at_ticks: result.evaluated_at_ticks,
        };

        if !decision.allowed {
            debug!(
                policy = %policy.name,
                identity = %request.identity.component_string(),
                retry_after_ms = result.retry_after_ticks,
                "request denied"
            );
            self.emit_audit(&policy, request, &decision);
        }

        Ok(Some(decision))
    }

    /// Case-insensitive policy lookup
    pub fn get_policy(&self, name: &str) -> Option<Arc<Policy>> {
        self.cache.get_policy(name)
    }

    /// Current immutable policy snapshot
    pub fn snapshot_policies(&self) -> PolicySnapshot {
        self.cache.snapshot_policies()
    }

    /// The policy cache backing this service
    pub fn cache(&self) -> &Arc<PolicyCache> {
        &self.cache
    }

    /// Stop background work (refresh timer, config subscription)
    pub fn shutdown(&self) {
        self.cache.shutdown();
    }

    /// Hand a deny to the audit sink without blocking the decision path
    fn emit_audit(&self, policy: &Policy, request: &RateLimitRequest, decision: &Decision) {
        if !self.config.audit_logging_enabled {
            return;
        }
        let Some(sink) = &self.audit else {
            return;
        };

        let entry = AuditEntry {
            policy_name: policy.name.clone(),
            identity: request.identity.component_string(),
            allowed: decision.allowed,
            limit: decision.counters.limit,
            remaining: decision.counters.remaining,
            retry_after_ms: decision.retry_after.as_millis() as i64,
            endpoint: request.endpoint.clone(),
            timestamp: Utc::now(),
        };

        let sink = Arc::clone(sink);
        tokio::spawn(async move {
            if let Err(e) = sink.insert(entry).await {
                warn!(error = %e, "audit insert failed");
            }
        });
    }
}

/// Builder wiring the service's collaborators
pub struct RateLimitServiceBuilder {
    config: LimiterConfig,
    evaluator: Option<Arc<dyn StoreEvaluator>>,
    repository: Option<Arc<dyn PolicyRepository>>,
    audit: Option<Arc<dyn AuditSink>>,
    clock: Option<Arc<dyn TimeSource>>,
    config_changes: Option<watch::Receiver<LimiterConfig>>,
}

impl RateLimitServiceBuilder {
    /// Use a specific store evaluator instead of the config-driven default
    pub fn with_evaluator(mut self, evaluator: Arc<dyn StoreEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Attach the policy repository
    pub fn with_repository(mut self, repository: Arc<dyn PolicyRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Attach the audit sink
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Override the time source (tests)
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Subscribe the policy cache to configuration changes
    pub fn with_config_changes(mut self, receiver: watch::Receiver<LimiterConfig>) -> Self {
        self.config_changes = Some(receiver);
        self
    }

    /// Validate the configuration, connect the store, and initialise the cache
    pub async fn build(self) -> Result<RateLimitService> {
        self.config
            .validate()
            .map_err(LimiterError::Config)?;

        let evaluator: Arc<dyn StoreEvaluator> = match self.evaluator {
            Some(evaluator) => evaluator,
            None if self.config.redis.enabled => {
                let pool = match RedisPool::new(&self.config.redis).await {
                    Ok(pool) => pool,
                    Err(e) => {
                        warn!(error = %e, "store unavailable at startup, failing open");
                        RedisPool::create_noop()
                    }
                };
                Arc::new(RedisEvaluator::new(pool, &self.config.redis))
            }
            None => Arc::new(MemoryEvaluator::new()),
        };

        let cache = PolicyCache::new(&self.config, self.repository);
        cache.initialize(self.config_changes).await?;

        Ok(RateLimitService {
            config: self.config,
            cache,
            evaluator,
            windows: DashMap::new(),
            audit: self.audit,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(SystemTimeSource)),
        })
    }
}
