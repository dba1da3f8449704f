//! Token-bucket evaluation

use super::types::{BucketState, Computation};
use crate::core::policy::Policy;
use crate::utils::error::{LimiterError, Result};

/// Evaluate one request against token-bucket state
///
/// Pure function of `(state, policy, now_ticks, requested_tokens)`. The store
/// script mirrors this arithmetic operation for operation; any change here
/// must land there as well.
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

    let refill_rate = policy.permit_limit as f64 / window_ticks as f64;
    if refill_rate <= 0.0 || !refill_rate.is_finite() {
        return Err(LimiterError::Config(format!(
            "policy '{}' refill rate underflows",
            policy.name
        )));
    }

    // First contact sees a full bucket anchored at now.
    let (mut tokens, last_refill_ticks) = match state {
        BucketState::TokenBucket {
            tokens,
            last_refill_ticks,
        } if last_refill_ticks != 0 => (tokens, last_refill_ticks),
        _ => (burst, now_ticks),
    };

    // Retrograde clocks clamp to zero; the bucket never rolls backwards.
    let elapsed = (now_ticks - last_refill_ticks).max(0);
    if elapsed > 0 {
        tokens = (tokens + elapsed as f64 * refill_rate).min(burst);
    }

    let requested = (requested_tokens as f64).min(burst);
    let precision_ticks = policy.precision_ticks();
    let cooldown_ticks = policy.cooldown_ticks();

    let allowed = tokens >= requested;
    let (used_this_call, retry_after_ticks) = if allowed {
        tokens -= requested;
        (requested, 0)
    } else {
        let shortage = requested - tokens;
        let mut ticks_until = (shortage / refill_rate).ceil() as i64;
        if ticks_until < precision_ticks {
            ticks_until = precision_ticks;
        }
        let mut retry = ticks_until.min(window_ticks);
        if cooldown_ticks > 0 && retry < cooldown_ticks {
            retry = cooldown_ticks;
        }
        (0.0, retry)
    };

    let mut reset_after_ticks = ((burst - tokens) / refill_rate).ceil() as i64;
    if reset_after_ticks < precision_ticks {
        reset_after_ticks = precision_ticks;
    }
    if reset_after_ticks > window_ticks {
        reset_after_ticks = window_ticks;
    }

    // Refill is a function of time, not of admission: the anchor always
    // advances, even on deny.
    let new_state = BucketState::TokenBucket {
        tokens,
        last_refill_ticks: now_ticks,
    };

    Ok((
        new_state,
        Computation {
            allowed,
            retry_after_ticks,
            reset_after_ticks,
            used_this_call,
            remaining: tokens.max(0.0),
        },
    ))
}
