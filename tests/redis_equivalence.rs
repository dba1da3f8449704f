//! Reference-vs-script equivalence against a live Redis
//!
//! The store scripts must implement the same arithmetic as the in-process
//! algorithms. These tests drive both evaluators through identical random
//! request sequences and require identical allow/deny decisions and counters
//! within floating tolerance.
//!
//! They need a Redis at `REDIS_URL` (default `redis://127.0.0.1:6379`) and
//! are ignored by default:
//!
//! ```text
//! cargo test --test redis_equivalence -- --ignored
//! ```

use ratekeeper::{
    Algorithm, MemoryEvaluator, Policy, RedisConfig, RedisEvaluator, RedisPool, StoreEvaluator,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn redis_config() -> RedisConfig {
    RedisConfig {
        url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
        key_prefix: "ratekeeper-test".to_string(),
        ..Default::default()
    }
}

fn policy(seed: u64, algorithm: Algorithm) -> Policy {
    // Small deterministic spread of shapes per seed.
    let permit = 1 + (seed % 17) as u32;
    let window_ms = 500 + (seed % 13) * 250;
    let burst = if seed % 3 == 0 {
        Some(permit + (seed % 7) as u32)
    } else {
        None
    };
    let cooldown = if seed % 5 == 0 {
        Some(Duration::from_millis(1_000 + (seed % 4) * 500))
    } else {
        None
    };

    Policy {
        name: format!("equiv-{}", seed),
        algorithm,
        permit_limit: permit,
        window: Duration::from_millis(window_ms),
        burst_limit: burst,
        precision: Duration::from_millis(100),
        cooldown,
        tokens_per_request: 1,
        sliding_window_metrics: false,
    }
}

/// Multiplicative congruential sequence; cheap and reproducible
fn next_seed(seed: &mut u64) -> u64 {
    *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    *seed >> 33
}

async fn run_battery(algorithm: Algorithm) {
    let config = redis_config();
    let pool = RedisPool::new(&config)
        .await
        .expect("live Redis required (set REDIS_URL)");
    let redis = RedisEvaluator::new(pool, &config);
    let reference = MemoryEvaluator::new();

    let run_id = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();

    for battery in 0..25u64 {
        let policy = policy(battery, algorithm);
        let key = format!("{}:{}:battery", run_id, policy.name);
        let mut now = 1_000_000i64;
        let mut rng = battery + 1;

        for step in 0..40 {
            now += (next_seed(&mut rng) % 400) as i64;
            let cost = (next_seed(&mut rng) % 4) as u32 + 1;

            let expected = reference
                .evaluate(&key, &policy, now, cost)
                .await
                .unwrap();
            let actual = redis.evaluate(&key, &policy, now, cost).await.unwrap();

            assert_eq!(
                expected.allowed, actual.allowed,
                "decision diverged at battery {} step {}",
                battery, step
            );
            assert!(
                (expected.remaining - actual.remaining).abs() < 1e-6,
                "remaining diverged at battery {} step {}: {} vs {}",
                battery,
                step,
                expected.remaining,
                actual.remaining
            );
            assert_eq!(
                expected.retry_after_ticks, actual.retry_after_ticks,
                "retry-after diverged at battery {} step {}",
                battery, step
            );
            assert_eq!(
                expected.reset_after_ticks, actual.reset_after_ticks,
                "reset-after diverged at battery {} step {}",
                battery, step
            );
        }
    }
}

#[tokio::test]
#[ignore = "requires a live Redis"]
async fn token_bucket_script_matches_the_reference() {
    run_battery(Algorithm::TokenBucket).await;
}

#[tokio::test]
#[ignore = "requires a live Redis"]
async fn leaky_bucket_script_matches_the_reference() {
    run_battery(Algorithm::LeakyBucket).await;
}
