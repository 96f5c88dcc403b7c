//! Retry execution engine
//!
//! This module provides the retry loop: invoke the operation, classify the
//! failure, back off, and repeat until success, exhaustion, a terminal
//! failure, or an interruption from the caller.

use std::future::Future;
use std::sync::Arc;

use tokio::time::Instant;

use crate::types::RetryPolicy;

use super::backoff::{calculate_delay, JitterSource, ThreadRngJitter};
use super::classify::is_retryable;
use super::context::CallContext;
use super::error::{Interruption, RetryError};
use super::failure::{FailureKind, FailureSource};
use super::observer::{AttemptOutcome, NoOpObserver, RetryObserver};

/// Execute an async operation with retry logic based on a policy
///
/// This is a convenience function for simple retry scenarios. For more
/// control, use `RetryExecutorBuilder`.
///
/// # Example
///
/// ```rust,no_run
/// use rebound_core::retry::retry_with_policy;
/// use rebound_core::types::RetryPolicy;
///
/// async fn example() {
///     let policy = RetryPolicy::default();
///
///     let result = retry_with_policy(&policy, || async {
///         Ok::<_, std::io::Error>("success")
///     }).await;
/// }
/// ```
pub async fn retry_with_policy<F, Fut, T, E>(policy: &RetryPolicy, op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: FailureSource,
{
    RetryExecutor::new(policy.clone()).execute(op).await
}

/// Builder for configuring a `RetryExecutor`
///
/// # Example
///
/// ```rust
/// use rebound_core::retry::{RetryExecutorBuilder, SeededJitter, TracingObserver};
/// use rebound_core::types::RetryPolicy;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(RetryPolicy::default())
///     .with_observer(TracingObserver::new("download"))
///     .with_jitter(SeededJitter::new(7))
///     .build();
/// ```
pub struct RetryExecutorBuilder<O = NoOpObserver> {
    policy: RetryPolicy,
    observer: O,
    jitter: Arc<dyn JitterSource>,
}

impl Default for RetryExecutorBuilder<NoOpObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder<NoOpObserver> {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            observer: NoOpObserver,
            jitter: Arc::new(ThreadRngJitter),
        }
    }
}

impl<O> RetryExecutorBuilder<O> {
    /// Set the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the observer
    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<O2> {
        RetryExecutorBuilder {
            policy: self.policy,
            observer,
            jitter: self.jitter,
        }
    }

    /// Set the jitter source
    pub fn with_jitter(mut self, jitter: impl JitterSource + 'static) -> Self {
        self.jitter = Arc::new(jitter);
        self
    }

    /// Build the executor
    pub fn build(self) -> RetryExecutor<O> {
        RetryExecutor {
            policy: self.policy,
            observer: self.observer,
            jitter: self.jitter,
        }
    }
}

/// A retry executor with a fixed policy, observer and jitter source
///
/// The executor holds no per-call state, so one instance can serve many
/// concurrent invocations.
pub struct RetryExecutor<O = NoOpObserver> {
    policy: RetryPolicy,
    observer: O,
    jitter: Arc<dyn JitterSource>,
}

impl RetryExecutor<NoOpObserver> {
    /// Executor for `policy` with no observer and thread-local jitter
    pub fn new(policy: RetryPolicy) -> Self {
        RetryExecutorBuilder::new().with_policy(policy).build()
    }

    pub fn builder() -> RetryExecutorBuilder<NoOpObserver> {
        RetryExecutorBuilder::new()
    }
}

impl<O> RetryExecutor<O>
where
    O: RetryObserver,
{
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T, E>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: FailureSource,
    {
        self.execute_with(&CallContext::default(), op).await
    }

    /// Execute an operation with retry logic, honouring the caller's
    /// cancellation token and deadline
    pub async fn execute_with<F, Fut, T, E>(
        &self,
        ctx: &CallContext,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: FailureSource,
    {
        let start = Instant::now();
        let max_attempts = self.policy.attempts();
        let mut last_error: Option<E> = None;

        for attempt in 1..=max_attempts {
            if let Some(interruption) = ctx.interruption() {
                return Err(self.interrupted(interruption, attempt - 1, last_error));
            }

            let err = match ctx.guard(op()).await {
                Ok(Ok(result)) => {
                    self.observer.on_success(attempt, start.elapsed());
                    return Ok(result);
                }
                Ok(Err(err)) => err,
                Err(interruption) => {
                    return Err(self.interrupted(interruption, attempt, last_error));
                }
            };

            let failure = err.to_failure();

            // Cancellation reported by the operation itself is never retried
            if failure.kind() == FailureKind::Cancelled {
                self.observer.on_attempt_failed(&AttemptOutcome::failed(
                    attempt,
                    max_attempts,
                    failure,
                    false,
                    None,
                ));
                self.observer
                    .on_interrupted(attempt, Interruption::Cancelled);
                return Err(RetryError::aborted(attempt, err));
            }

            if !is_retryable(&failure, &self.policy) {
                self.observer.on_attempt_failed(&AttemptOutcome::failed(
                    attempt,
                    max_attempts,
                    failure,
                    false,
                    None,
                ));
                return Err(RetryError::non_retryable(attempt, err));
            }

            if attempt >= max_attempts {
                self.observer.on_attempt_failed(&AttemptOutcome::failed(
                    attempt,
                    max_attempts,
                    failure.clone(),
                    true,
                    None,
                ));
                self.observer.on_exhausted(attempt, &failure);
                return Err(RetryError::exhausted(attempt, err, start.elapsed()));
            }

            let delay = calculate_delay(&self.policy, attempt, self.jitter.as_ref());
            self.observer.on_attempt_failed(&AttemptOutcome::failed(
                attempt,
                max_attempts,
                failure,
                true,
                Some(delay),
            ));
            last_error = Some(err);

            if !delay.is_zero() {
                if let Err(interruption) = ctx.guard(tokio::time::sleep(delay)).await {
                    return Err(self.interrupted(interruption, attempt, last_error));
                }
            }
        }

        // Unreachable: the final iteration always returns
        Err(RetryError::cancelled(max_attempts, last_error))
    }

    fn interrupted<E>(
        &self,
        interruption: Interruption,
        attempts: u32,
        last_error: Option<E>,
    ) -> RetryError<E> {
        self.observer.on_interrupted(attempts, interruption);
        RetryError::interrupted(interruption, attempts, last_error)
    }
}
