//! Leaky-bucket evaluation

use super::types::{BucketState, Computation};
use crate::core::policy::Policy;
use crate::utils::error::{LimiterError, Result};

/// Evaluate one request against leaky-bucket state
///
/// Symmetric to the token bucket over the water level: requests fill the
/// bucket and time drains it. Mirrored by the store script.
pub(super) fn evaluate(
    state: BucketState,
    policy: &Policy,
    now_ticks: i64,
    requested_tokens: u32,
) -> Result<(BucketState, Computation)> {
    let burst = policy.burst_capacity() as f64;
    let window_ticks = policy.window_ticks();
    if window_ticks <= 0 {
        return Err(LimiterError::Config(format!(
            "policy '{}' has a degenerate window",
            policy.name
        )));
    }

    let leak_rate = policy.permit_limit as f64 / window_ticks as f64;
    if leak_rate <= 0.0 || !leak_rate.is_finite() {
        return Err(LimiterError::Config(format!(
            "policy '{}' leak rate underflows",
            policy.name
        )));
    }

    // First contact sees an empty bucket anchored at now.
    let (mut water_level, last_drip_ticks) = match state {
        BucketState::LeakyBucket {
            water_level,
            last_drip_ticks,
        } if last_drip_ticks != 0 => (water_level, last_drip_ticks),
        _ => (0.0, now_ticks),
    };

    let elapsed = (now_ticks - last_drip_ticks).max(0);
    if elapsed > 0 {
        water_level = (water_level - elapsed as f64 * leak_rate).max(0.0);
    }

    let requested = (requested_tokens as f64).min(burst);
    let precision_ticks = policy.precision_ticks();
    let cooldown_ticks = policy.cooldown_ticks();

    let allowed = water_level + requested <= burst;
    let (used_this_call, retry_after_ticks) = if allowed {
        water_level += requested;
        (requested, 0)
    } else {
        let overflow = (water_level + requested) - burst;
        let mut ticks_until = (overflow / leak_rate).ceil() as i64;
        if ticks_until < precision_ticks {
            ticks_until = precision_ticks;
        }
        let mut retry = ticks_until.min(window_ticks);
        if cooldown_ticks > 0 && retry < cooldown_ticks {
            retry = cooldown_ticks;
        }
        (0.0, retry)
    };

    let mut reset_after_ticks = (water_level / leak_rate).ceil() as i64;
    if reset_after_ticks < precision_ticks {
        reset_after_ticks = precision_ticks;
    }
    if reset_after_ticks > window_ticks {
        reset_after_ticks = window_ticks;
    }

    let new_state = BucketState::LeakyBucket {
        water_level,
        last_drip_ticks: now_ticks,
    };

    Ok((
        new_state,
        Computation {
            allowed,
            retry_after_ticks,
            reset_after_ticks,
            used_this_call,
            remaining: (burst - water_level).max(0.0),
        },
    ))
}
