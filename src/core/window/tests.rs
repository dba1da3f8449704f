//! Tests for the sliding-window counter

#[cfg(test)]
mod tests {
    use super::super::SlidingWindowCounter;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_hits_and_rate_inside_window() {
        // W=10s over 5 buckets; 5 samples at t=100s.
        let counter = SlidingWindowCounter::new(Duration::from_secs(10), 5);
        for _ in 0..5 {
            counter.add_sample(100_000, 1.0);
        }

        let sample = counter.snapshot(100_000);
        assert_eq!(sample.hits, 5.0);
        assert!((sample.rate_per_second - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stale_buckets_age_out() {
        // W=5s over 5 buckets; 3 samples at t=0 are invisible at t=10s.
        let counter = SlidingWindowCounter::new(Duration::from_secs(5), 5);
        for _ in 0..3 {
            counter.add_sample(0, 1.0);
        }

        let sample = counter.snapshot(10_000);
        assert_eq!(sample.hits, 0.0);
        assert_eq!(sample.rate_per_second, 0.0);
    }

    #[test]
    fn test_hits_monotonic_without_clock_advance() {
        let counter = SlidingWindowCounter::new(Duration::from_secs(10), 5);
        let mut previous = 0.0;

        for i in 0..50 {
            counter.add_sample(42_000, 1.0);
            let hits = counter.snapshot(42_000).hits;
            assert!(hits >= previous, "hits regressed at sample {}", i);
            previous = hits;
        }
        assert_eq!(previous, 50.0);
    }

    #[test]
    fn test_bucket_reuse_resets_old_epoch() {
        let counter = SlidingWindowCounter::new(Duration::from_secs(10), 5);

        // Land in bucket 0, then wrap the ring back into the same slot a
        // full window later.
        counter.add_sample(0, 7.0);
        counter.add_sample(10_000, 1.0);

        let sample = counter.snapshot(10_000);
        assert_eq!(sample.hits, 1.0, "old epoch value must not leak");
    }

    #[test]
    fn test_fractional_values_accumulate() {
        let counter = SlidingWindowCounter::new(Duration::from_secs(4), 4);
        counter.add_sample(1_000, 0.25);
        counter.add_sample(1_500, 0.25);
        counter.add_sample(2_000, 0.5);

        let sample = counter.snapshot(2_000);
        assert!((sample.hits - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_updates_lose_nothing() {
        let counter = Arc::new(SlidingWindowCounter::new(Duration::from_secs(10), 5));
        let threads = 8;
        let per_thread = 1_000;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..per_thread {
                        counter.add_sample(5_000, 1.0);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let sample = counter.snapshot(5_000);
        assert_eq!(sample.hits, (threads * per_thread) as f64);
    }
}
