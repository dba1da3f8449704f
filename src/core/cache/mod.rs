//! Policy cache
//!
//! Holds an immutable snapshot of policy definitions merged from static
//! configuration and the policy repository. The snapshot is swapped
//! atomically; readers never block and never observe a partially built
//! mapping. Refreshes run single-flight: a trigger arriving while one is in
//! progress coalesces into it.

#[cfg(test)]
mod tests;

use crate::config::models::{LimiterConfig, PolicyConfig};
use crate::core::policy::Policy;
use crate::repository::PolicyRepository;
use crate::utils::error::Result;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Immutable snapshot type: lowercased policy name to policy
pub type PolicySnapshot = Arc<HashMap<String, Arc<Policy>>>;

/// In-memory snapshot of policy definitions
pub struct PolicyCache {
    snapshot: RwLock<PolicySnapshot>,
    configured: RwLock<Vec<PolicyConfig>>,
    repository: Option<Arc<dyn PolicyRepository>>,
    reload_interval: Option<Duration>,
    warm_on_startup: bool,
    refreshing: AtomicBool,
    published_once: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PolicyCache {
    /// Create a cache over the configured policies and an optional repository
    pub fn new(
        config: &LimiterConfig,
        repository: Option<Arc<dyn PolicyRepository>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            snapshot: RwLock::new(Arc::new(HashMap::new())),
            configured: RwLock::new(config.policies.clone()),
            repository,
            reload_interval: config.policy_reload_interval(),
            warm_on_startup: config.warm_policies_on_startup,
            refreshing: AtomicBool::new(false),
            published_once: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Install the initial snapshot and start the background refresh triggers
    ///
    /// With warm startup the first refresh completes before this returns;
    /// otherwise an empty snapshot is published and an immediate refresh is
    /// scheduled in the background.
    pub async fn initialize(
        self: &Arc<Self>,
        config_changes: Option<watch::Receiver<LimiterConfig>>,
    ) -> Result<()> {
        if self.warm_on_startup {
            self.refresh().await?;
        } else {
            let cache = Arc::clone(self);
            self.tasks.lock().push(tokio::spawn(async move {
                if let Err(e) = cache.refresh().await {
                    error!(error = %e, "initial policy refresh failed");
                }
            }));
        }

        self.spawn_reload_timer();
        if let Some(receiver) = config_changes {
            self.spawn_config_listener(receiver);
        }

        Ok(())
    }

    /// Merge both sources and publish a new snapshot
    ///
    /// Invalid configured entries are skipped with an error log. A repository
    /// failure retains the previous snapshot; the next trigger retries.
    pub async fn refresh(&self) -> Result<()> {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("policy refresh already in flight, coalescing");
            return Ok(());
        }

        let result = self.refresh_inner().await;
        self.refreshing.store(false, Ordering::Release);
        result
    }

    async fn refresh_inner(&self) -> Result<()> {
        let configured = self.configured.read().clone();
        let mut merged: HashMap<String, Arc<Policy>> = HashMap::new();

        for entry in &configured {
            let policy = entry.to_policy();
            if let Err(e) = policy.validate() {
                error!(policy = %entry.name, error = %e, "skipping invalid configured policy");
                continue;
            }
            merged.insert(policy.name.to_ascii_lowercase(), Arc::new(policy));
        }

        // Repository entries overwrite configured entries by name.
        if let Some(repository) = &self.repository {
            match repository.get_policies().await {
                Ok(persisted) => {
                    for policy in persisted {
                        if let Err(e) = policy.validate() {
                            error!(policy = %policy.name, error = %e, "skipping invalid persisted policy");
                            continue;
                        }
                        merged.insert(policy.name.to_ascii_lowercase(), Arc::new(policy));
                    }
                }
                Err(e) => {
                    error!(error = %e, "policy repository fetch failed");
                    if self.published_once.load(Ordering::Acquire) {
                        // Previous snapshot retained; the next trigger retries.
                        return Ok(());
                    }
                    // Nothing published yet: fall through with the configured
                    // entries so lookups are not empty until the store heals.
                }
            }
        }

        let count = merged.len();
        *self.snapshot.write() = Arc::new(merged);
        self.published_once.store(true, Ordering::Release);
        info!(policies = count, "policy snapshot published");
        Ok(())
    }

    /// Replace the configured policy list (config-change delivery)
    pub fn update_configured(&self, policies: Vec<PolicyConfig>) {
        *self.configured.write() = policies;
    }

    /// O(1), non-blocking, case-insensitive lookup
    pub fn get_policy(&self, name: &str) -> Option<Arc<Policy>> {
        self.snapshot.read().get(&name.to_ascii_lowercase()).cloned()
    }

    /// Current immutable snapshot
    pub fn snapshot_policies(&self) -> PolicySnapshot {
        self.snapshot.read().clone()
    }

    /// Stop the background refresh triggers
    pub fn shutdown(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }

    fn spawn_reload_timer(self: &Arc<Self>) {
        let Some(period) = self.reload_interval else {
            debug!("policy reload timer disabled");
            return;
        };

        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; initialization already
            // scheduled that refresh.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else { break };
                if let Err(e) = cache.refresh().await {
                    error!(error = %e, "scheduled policy refresh failed");
                }
            }
        });
        self.tasks.lock().push(handle);
    }

    fn spawn_config_listener(self: &Arc<Self>, mut receiver: watch::Receiver<LimiterConfig>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let Some(cache) = weak.upgrade() else { break };
                let config = receiver.borrow_and_update().clone();
                cache.update_configured(config.policies);
                if let Err(e) = cache.refresh().await {
                    error!(error = %e, "config-change policy refresh failed");
                }
            }
        });
        self.tasks.lock().push(handle);
    }
}

impl Drop for PolicyCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}
