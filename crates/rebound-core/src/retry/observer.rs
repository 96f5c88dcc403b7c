//! Retry observation and logging
//!
//! The executor reports attempt outcomes to a [`RetryObserver`]. The
//! [`TracingObserver`] turns them into structured `tracing` events.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::error::Interruption;
use super::failure::Failure;

/// Record of a single attempt, handed to the observer and then dropped
#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    /// Attempt index (1-based)
    pub attempt: u32,
    /// Maximum number of attempts configured
    pub max_attempts: u32,
    /// The failure, if the attempt failed
    pub failure: Option<Failure>,
    /// Whether the failure was classified as retryable
    pub retryable: bool,
    /// Delay before the next attempt, if one will be made
    pub delay: Option<Duration>,
}

impl AttemptOutcome {
    /// Outcome of a failed attempt
    pub fn failed(
        attempt: u32,
        max_attempts: u32,
        failure: Failure,
        retryable: bool,
        delay: Option<Duration>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            failure: Some(failure),
            retryable,
            delay,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn will_retry(&self) -> bool {
        self.delay.is_some()
    }

    /// Status code carried by the failure, if any
    pub fn status(&self) -> Option<u16> {
        self.failure.as_ref().and_then(Failure::status_code)
    }
}

/// Observer trait for retry events
///
/// # Example
///
/// ```rust
/// use rebound_core::retry::{AttemptOutcome, Failure, RetryObserver};
/// use std::time::Duration;
///
/// struct MetricsObserver;
///
/// impl RetryObserver for MetricsObserver {
///     fn on_attempt_failed(&self, outcome: &AttemptOutcome) {
///         // Record failure metric, tagged with outcome.status()
///     }
///
///     fn on_success(&self, attempt: u32, total_duration: Duration) {
///         // Record success metric with latency
///     }
///
///     fn on_exhausted(&self, attempts: u32, final_failure: &Failure) {
///         // Record exhaustion metric
///     }
/// }
/// ```
pub trait RetryObserver: Send + Sync {
    /// Called for every failed attempt, whether or not it will be retried
    fn on_attempt_failed(&self, outcome: &AttemptOutcome);

    /// Called when the operation succeeds
    fn on_success(&self, attempt: u32, total_duration: Duration);

    /// Called when the final allowed attempt failed with a retryable error
    fn on_exhausted(&self, attempts: u32, final_failure: &Failure);

    /// Called when the caller cancelled or the deadline elapsed
    fn on_interrupted(&self, attempt: u32, interruption: Interruption) {
        let _ = (attempt, interruption);
    }
}

/// A no-op observer
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_failed(&self, _outcome: &AttemptOutcome) {}

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _final_failure: &Failure) {}
}

/// An observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_failed`: WARN when retrying, DEBUG otherwise
/// - `on_success`: INFO (if > 1 attempt) or DEBUG (first attempt)
/// - `on_exhausted`: ERROR
/// - `on_interrupted`: WARN
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the operation being retried (for log context)
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_failed(&self, outcome: &AttemptOutcome) {
        let error = outcome
            .failure
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        match outcome.delay {
            Some(delay) => tracing::warn!(
                operation = %self.operation,
                attempt = outcome.attempt,
                max_attempts = outcome.max_attempts,
                error = %error,
                status = outcome.status(),
                will_retry = true,
                delay_ms = delay.as_millis() as u64,
                "request failed, will retry"
            ),
            None => tracing::debug!(
                operation = %self.operation,
                attempt = outcome.attempt,
                max_attempts = outcome.max_attempts,
                error = %error,
                status = outcome.status(),
                retryable = outcome.retryable,
                will_retry = false,
                "request failed"
            ),
        }
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt = attempt,
                total_duration_ms = total_duration.as_millis() as u64,
                "succeeded after retry"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                duration_ms = total_duration.as_millis() as u64,
                "succeeded on first attempt"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, final_failure: &Failure) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            error = %final_failure,
            status = final_failure.status_code(),
            "all retry attempts exhausted"
        );
    }

    fn on_interrupted(&self, attempt: u32, interruption: Interruption) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            reason = %interruption,
            "retry interrupted"
        );
    }
}

/// An observer that counts retry events
///
/// Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    /// Failed attempt events
    pub failures: AtomicU32,
    /// Failed attempts followed by a backoff delay
    pub retries: AtomicU32,
    /// Success events
    pub successes: AtomicU32,
    /// Exhaustion events
    pub exhaustions: AtomicU32,
    /// Cancellation and deadline events
    pub interruptions: AtomicU32,
}

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn retries(&self) -> u32 {
        self.retries.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    pub fn interruptions(&self) -> u32 {
        self.interruptions.load(Ordering::SeqCst)
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_failed(&self, outcome: &AttemptOutcome) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        if outcome.will_retry() {
            self.retries.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _final_failure: &Failure) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_interrupted(&self, _attempt: u32, _interruption: Interruption) {
        self.interruptions.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for std::sync::Arc<T> {
    fn on_attempt_failed(&self, outcome: &AttemptOutcome) {
        (**self).on_attempt_failed(outcome)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, final_failure: &Failure) {
        (**self).on_exhausted(attempts, final_failure)
    }

    fn on_interrupted(&self, attempt: u32, interruption: Interruption) {
        (**self).on_interrupted(attempt, interruption)
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for Box<T> {
    fn on_attempt_failed(&self, outcome: &AttemptOutcome) {
        (**self).on_attempt_failed(outcome)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, final_failure: &Failure) {
        (**self).on_exhausted(attempts, final_failure)
    }

    fn on_interrupted(&self, attempt: u32, interruption: Interruption) {
        (**self).on_interrupted(attempt, interruption)
    }
}
