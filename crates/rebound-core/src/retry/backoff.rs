//! Backoff delay computation
//!
//! Delays grow exponentially from `initial_delay`, are capped at `max_delay`
//! and then perturbed by up to ±25% jitter. Randomness comes from an injected
//! [`JitterSource`] so schedules can be reproduced in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

use crate::types::RetryPolicy;

/// Maximum relative jitter applied to the capped delay
pub const JITTER_FACTOR: f64 = 0.25;

/// Source of jitter samples in `[-1.0, 1.0]`
pub trait JitterSource: Send + Sync {
    /// Draw the next sample
    fn sample(&self) -> f64;
}

/// Jitter drawn from the thread-local generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn sample(&self) -> f64 {
        rand::rng().random_range(-1.0..=1.0)
    }
}

/// Deterministic jitter from a seeded generator
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn sample(&self) -> f64 {
        // A poisoned lock still holds a usable generator
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random_range(-1.0..=1.0)
    }
}

/// No jitter: delays are exactly the capped exponential values
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn sample(&self) -> f64 {
        0.0
    }
}

/// Always returns the same sample
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// Compute the delay after failed attempt `attempt` (1-indexed) for a given
/// jitter sample `jitter` in `[-1.0, 1.0]`
///
/// The cap is applied before jitter, so the result never exceeds
/// `max_delay * 1.25` and is never negative.
///
/// # Example
///
/// ```rust
/// use rebound_core::retry::compute_delay;
/// use rebound_core::types::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(compute_delay(1, &policy, 0.0), Duration::from_millis(1000));
/// assert_eq!(compute_delay(2, &policy, 0.0), Duration::from_millis(2000));
/// assert_eq!(compute_delay(2, &policy, 1.0), Duration::from_millis(2500));
/// ```
pub fn compute_delay(attempt: u32, policy: &RetryPolicy, jitter: f64) -> Duration {
    let exponent = attempt.saturating_sub(1) as f64;
    let multiplier = policy.backoff_multiplier.max(1.0);
    let max_ms = policy.max_delay_ms as f64;

    let raw_ms = policy.initial_delay_ms as f64 * multiplier.powf(exponent);
    let base_ms = if raw_ms.is_finite() {
        raw_ms.min(max_ms)
    } else {
        max_ms
    };

    let u = if jitter.is_finite() {
        jitter.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let jittered_ms = (base_ms + base_ms * JITTER_FACTOR * u).max(0.0);

    Duration::from_micros((jittered_ms * 1000.0) as u64)
}

/// Calculate the delay before the next attempt, drawing jitter from `jitter`
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32, jitter: &dyn JitterSource) -> Duration {
    compute_delay(attempt, policy, jitter.sample())
}

/// Delays that precede attempts `2..=max_attempts`
pub fn schedule(policy: &RetryPolicy, jitter: &dyn JitterSource) -> Vec<Duration> {
    (1..policy.attempts())
        .map(|attempt| calculate_delay(policy, attempt, jitter))
        .collect()
}
