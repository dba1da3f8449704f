//! Tests for the policy cache

#[cfg(test)]
mod tests {
    use super::super::PolicyCache;
    use crate::config::models::{LimiterConfig, PolicyConfig};
    use crate::core::policy::{Algorithm, Policy};
    use crate::repository::{MemoryPolicyRepository, PolicyRepository};
    use crate::utils::error::{LimiterError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn policy_config(name: &str, permit: u32) -> PolicyConfig {
        PolicyConfig {
            name: name.to_string(),
            algorithm: Algorithm::TokenBucket,
            permit_limit: permit,
            window_ms: 1_000,
            burst_limit: None,
            precision_ms: 100,
            cooldown_ms: None,
            tokens_per_request: 1,
            sliding_window_metrics: false,
        }
    }

    fn persisted_policy(name: &str, permit: u32) -> Policy {
        policy_config(name, permit).to_policy()
    }

    fn config_with(policies: Vec<PolicyConfig>) -> LimiterConfig {
        LimiterConfig {
            policies,
            policy_reload_interval_secs: 0,
            ..Default::default()
        }
    }

    /// Repository that fails every fetch
    struct FailingRepository;

    #[async_trait]
    impl PolicyRepository for FailingRepository {
        async fn get_policies(&self) -> Result<Vec<Policy>> {
            Err(LimiterError::Repository("unavailable".to_string()))
        }

        async fn upsert_policy(&self, _policy: Policy) -> Result<()> {
            Err(LimiterError::Repository("unavailable".to_string()))
        }
    }

    /// Repository that counts fetches and holds each one open briefly
    struct SlowCountingRepository {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl PolicyRepository for SlowCountingRepository {
        async fn get_policies(&self) -> Result<Vec<Policy>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(vec![persisted_policy("slow", 1)])
        }

        async fn upsert_policy(&self, _policy: Policy) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_repository_overwrites_configured_by_name() {
        let repository = Arc::new(MemoryPolicyRepository::with_policies([persisted_policy(
            "API", 99,
        )]));
        let cache = PolicyCache::new(
            &config_with(vec![policy_config("api", 5), policy_config("other", 7)]),
            Some(repository),
        );

        cache.refresh().await.unwrap();

        assert_eq!(cache.get_policy("api").unwrap().permit_limit, 99);
        assert_eq!(cache.get_policy("other").unwrap().permit_limit, 7);
        assert_eq!(cache.snapshot_policies().len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let cache = PolicyCache::new(&config_with(vec![policy_config("Api-Default", 5)]), None);
        cache.refresh().await.unwrap();

        assert!(cache.get_policy("api-default").is_some());
        assert!(cache.get_policy("API-DEFAULT").is_some());
        assert!(cache.get_policy("unknown").is_none());
    }

    #[tokio::test]
    async fn test_invalid_configured_entry_is_skipped() {
        let mut bad = policy_config("bad", 5);
        bad.permit_limit = 0;
        let cache = PolicyCache::new(&config_with(vec![bad, policy_config("good", 5)]), None);

        cache.refresh().await.unwrap();

        assert!(cache.get_policy("bad").is_none());
        assert!(cache.get_policy("good").is_some());
    }

    #[tokio::test]
    async fn test_repository_failure_retains_previous_snapshot() {
        let cache = PolicyCache::new(
            &config_with(vec![policy_config("configured", 3)]),
            Some(Arc::new(FailingRepository)),
        );

        // First refresh: nothing published yet, configured entries land.
        cache.refresh().await.unwrap();
        assert!(cache.get_policy("configured").is_some());

        // Later refreshes with a failing repository keep the snapshot as-is.
        cache.update_configured(vec![]);
        cache.refresh().await.unwrap();
        assert!(
            cache.get_policy("configured").is_some(),
            "previous snapshot must be retained on repository failure"
        );
    }

    #[tokio::test]
    async fn test_warm_initialize_publishes_before_returning() {
        let cache = PolicyCache::new(
            &LimiterConfig {
                policies: vec![policy_config("warm", 5)],
                warm_policies_on_startup: true,
                policy_reload_interval_secs: 0,
                ..Default::default()
            },
            None,
        );

        cache.initialize(None).await.unwrap();
        assert!(cache.get_policy("warm").is_some());
        cache.shutdown();
    }

    #[tokio::test]
    async fn test_lazy_initialize_refreshes_in_background() {
        let cache = PolicyCache::new(
            &LimiterConfig {
                policies: vec![policy_config("lazy", 5)],
                warm_policies_on_startup: false,
                policy_reload_interval_secs: 0,
                ..Default::default()
            },
            None,
        );

        cache.initialize(None).await.unwrap();

        // The background refresh lands shortly after initialize returns.
        for _ in 0..50 {
            if cache.get_policy("lazy").is_some() {
                cache.shutdown();
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("background refresh never published");
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_coalesce() {
        let repository = Arc::new(SlowCountingRepository {
            fetches: AtomicUsize::new(0),
        });
        let cache = PolicyCache::new(&config_with(vec![]), Some(repository.clone()));

        let first = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Second trigger while the first fetch is open: dropped, not queued.
        cache.refresh().await.unwrap();
        first.await.unwrap().unwrap();

        assert_eq!(repository.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_config_change_triggers_refresh() {
        let (sender, receiver) = crate::config::watch_channel(LimiterConfig::default());
        let cache = PolicyCache::new(
            &LimiterConfig {
                warm_policies_on_startup: true,
                policy_reload_interval_secs: 0,
                ..Default::default()
            },
            None,
        );
        cache.initialize(Some(receiver)).await.unwrap();
        assert!(cache.get_policy("pushed").is_none());

        sender
            .send(LimiterConfig {
                policies: vec![policy_config("pushed", 5)],
                ..Default::default()
            })
            .unwrap();

        for _ in 0..50 {
            if cache.get_policy("pushed").is_some() {
                cache.shutdown();
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("config change never reached the snapshot");
    }
}
