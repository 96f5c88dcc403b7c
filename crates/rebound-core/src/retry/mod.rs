//! Retry execution engine with policy-based configuration
//!
//! This module gives any fallible async operation uniform resilience:
//!
//! - Failures are normalized into a [`Failure`] via [`FailureSource`]
//! - [`is_retryable`] classifies them with the policy's status codes, or a
//!   caller-supplied `should_retry` override
//! - Delays grow exponentially, are capped, then jittered by ±25% from an
//!   injectable [`JitterSource`]
//! - [`RetryExecutor`] runs the attempt loop and honours a caller's
//!   cancellation token or deadline ([`CallContext`])
//! - Attempt outcomes are reported to a [`RetryObserver`]; the
//!   [`TracingObserver`] logs them
//! - [`wrap_callable`] decorates an existing async function without changing
//!   its signature
//!
//! # Example
//!
//! ```rust,no_run
//! use rebound_core::retry::{retry_with_policy, RetryError};
//! use rebound_core::types::RetryPolicy;
//!
//! async fn example() -> Result<String, RetryError<std::io::Error>> {
//!     let policy = RetryPolicy::default();
//!
//!     retry_with_policy(&policy, || async {
//!         // Your fallible operation here
//!         Ok("success".to_string())
//!     }).await
//! }
//! ```

mod backoff;
mod classify;
mod context;
mod error;
mod executor;
mod failure;
mod observer;
mod wrap;

pub use backoff::{
    calculate_delay, compute_delay, schedule, FixedJitter, JitterSource, NoJitter, SeededJitter,
    ThreadRngJitter, JITTER_FACTOR,
};
pub use classify::{
    is_retryable, AlwaysRetry, ClosurePredicate, DefaultClassifier, NeverRetry, RetryPredicate,
    ShouldRetry,
};
pub use context::CallContext;
pub use error::{Interruption, RetryError};
pub use executor::{retry_with_policy, RetryExecutor, RetryExecutorBuilder};
pub use failure::{Failure, FailureCode, FailureKind, FailureSource};
pub use observer::{AttemptOutcome, NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use tokio_util::sync::CancellationToken;
pub use wrap::wrap_callable;
