//! Failure classification
//!
//! Decides whether a [`Failure`] is transient. A policy's `should_retry`
//! predicate, when present, is the sole authority; otherwise the default
//! taxonomy below applies.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::failure::{Failure, FailureCode, FailureKind};
use crate::types::RetryPolicy;

/// Decide whether `failure` should be retried under `policy`
///
/// Default rules, first match wins:
/// 1. network failures (including refused/reset connections and DNS errors)
/// 2. timeouts
/// 3. status codes, retryable iff listed in `retryable_status_codes`
/// 4. aborted or timed-out connections reported only through their code
/// 5. everything else is terminal
///
/// # Example
///
/// ```rust
/// use rebound_core::retry::{is_retryable, Failure};
/// use rebound_core::types::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert!(is_retryable(&Failure::status(503, "unavailable"), &policy));
/// assert!(!is_retryable(&Failure::status(404, "not found"), &policy));
/// ```
pub fn is_retryable(failure: &Failure, policy: &RetryPolicy) -> bool {
    match &policy.should_retry {
        Some(predicate) => predicate.should_retry(failure),
        None => default_rules(failure, &policy.retryable_status_codes),
    }
}

fn default_rules(failure: &Failure, retryable_status_codes: &BTreeSet<u16>) -> bool {
    if failure.kind() == FailureKind::Network
        || matches!(
            failure.code(),
            Some(
                FailureCode::ConnectionRefused
                    | FailureCode::ConnectionReset
                    | FailureCode::DnsFailure
            )
        )
    {
        return true;
    }

    if failure.kind() == FailureKind::Timeout {
        return true;
    }

    if let Some(status) = failure.status_code() {
        return retryable_status_codes.contains(&status);
    }

    matches!(
        failure.code(),
        Some(FailureCode::ConnectionAborted | FailureCode::ConnectionTimedOut)
    )
}

/// A predicate that determines whether a failure should be retried
///
/// # Example
///
/// ```rust
/// use rebound_core::retry::{Failure, FailureKind, RetryPredicate};
///
/// struct OnlyTimeouts;
///
/// impl RetryPredicate for OnlyTimeouts {
///     fn should_retry(&self, failure: &Failure) -> bool {
///         failure.kind() == FailureKind::Timeout
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Determine whether the given failure should be retried
    fn should_retry(&self, failure: &Failure) -> bool;
}

/// A predicate that always returns true
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl RetryPredicate for AlwaysRetry {
    fn should_retry(&self, _failure: &Failure) -> bool {
        true
    }
}

/// A predicate that never retries
#[derive(Debug, Clone, Copy)]
pub struct NeverRetry;

impl RetryPredicate for NeverRetry {
    fn should_retry(&self, _failure: &Failure) -> bool {
        false
    }
}

/// The default taxonomy bound to an explicit status code set
///
/// Useful for composing a custom predicate on top of the default rules.
#[derive(Debug, Clone)]
pub struct DefaultClassifier {
    retryable_status_codes: BTreeSet<u16>,
}

impl DefaultClassifier {
    /// Classifier using the status codes of `policy`
    pub fn for_policy(policy: &RetryPolicy) -> Self {
        Self {
            retryable_status_codes: policy.retryable_status_codes.clone(),
        }
    }

    /// Classifier with custom retryable status codes
    pub fn with_codes(codes: impl IntoIterator<Item = u16>) -> Self {
        Self {
            retryable_status_codes: codes.into_iter().collect(),
        }
    }
}

impl Default for DefaultClassifier {
    fn default() -> Self {
        Self::for_policy(&RetryPolicy::default())
    }
}

impl RetryPredicate for DefaultClassifier {
    fn should_retry(&self, failure: &Failure) -> bool {
        default_rules(failure, &self.retryable_status_codes)
    }
}

/// A predicate that uses a closure to determine retryability
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    /// Create a new closure-based predicate
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> RetryPredicate for ClosurePredicate<F>
where
    F: Fn(&Failure) -> bool + Send + Sync,
{
    fn should_retry(&self, failure: &Failure) -> bool {
        (self.predicate)(failure)
    }
}

/// Shared, clonable override predicate stored on a [`RetryPolicy`]
#[derive(Clone)]
pub struct ShouldRetry(Arc<dyn RetryPredicate>);

impl ShouldRetry {
    /// Wrap a closure
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Failure) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(ClosurePredicate::new(predicate)))
    }

    /// Wrap any predicate implementation
    pub fn from_predicate<P: RetryPredicate + 'static>(predicate: P) -> Self {
        Self(Arc::new(predicate))
    }

    /// Evaluate the predicate
    pub fn should_retry(&self, failure: &Failure) -> bool {
        self.0.should_retry(failure)
    }
}

impl fmt::Debug for ShouldRetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShouldRetry(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_failures_are_retryable() {
        let policy = RetryPolicy::default();
        assert!(is_retryable(&Failure::network("connection reset"), &policy));
        assert!(is_retryable(
            &Failure::other("lookup failed").with_code(FailureCode::DnsFailure),
            &policy
        ));
    }

    #[test]
    fn test_timeouts_are_retryable() {
        let policy = RetryPolicy::default();
        assert!(is_retryable(&Failure::timeout("deadline exceeded"), &policy));
    }

    #[test]
    fn test_status_codes_follow_policy() {
        let policy = RetryPolicy::default();
        for status in [408, 429, 500, 502, 503, 504] {
            assert!(is_retryable(&Failure::status(status, "retry me"), &policy));
        }
        for status in [400, 401, 403, 404, 409, 501] {
            assert!(!is_retryable(&Failure::status(status, "terminal"), &policy));
        }

        let narrow = RetryPolicy::default().with_retryable_status_codes([418]);
        assert!(is_retryable(&Failure::status(418, "teapot"), &narrow));
        assert!(!is_retryable(&Failure::status(503, "unavailable"), &narrow));
    }

    #[test]
    fn test_status_rule_precedes_code_rule() {
        let policy = RetryPolicy::default();
        let failure = Failure::status(400, "bad request").with_code(FailureCode::ConnectionAborted);
        assert!(!is_retryable(&failure, &policy));
    }

    #[test]
    fn test_transport_codes_are_retryable() {
        let policy = RetryPolicy::default();
        assert!(is_retryable(
            &Failure::other("aborted").with_code(FailureCode::ConnectionAborted),
            &policy
        ));
        assert!(is_retryable(
            &Failure::other("timed out").with_code(FailureCode::ConnectionTimedOut),
            &policy
        ));
        assert!(!is_retryable(
            &Failure::other("weird").with_code(FailureCode::Other("EWEIRD".into())),
            &policy
        ));
    }

    #[test]
    fn test_other_failures_are_terminal() {
        let policy = RetryPolicy::default();
        assert!(!is_retryable(&Failure::other("parse error"), &policy));
    }

    #[test]
    fn test_should_retry_overrides_defaults() {
        let never = RetryPolicy::default().with_should_retry(|_| false);
        assert!(!is_retryable(&Failure::network("refused"), &never));
        assert!(!is_retryable(&Failure::status(503, "unavailable"), &never));

        let always = RetryPolicy::default().with_should_retry(|_| true);
        assert!(is_retryable(&Failure::status(404, "not found"), &always));
        assert!(is_retryable(&Failure::other("parse error"), &always));
    }

    #[test]
    fn test_classification_is_idempotent() {
        let policy = RetryPolicy::default();
        let failures = [
            Failure::network("refused"),
            Failure::status(400, "bad"),
            Failure::status(502, "bad gateway"),
            Failure::other("other"),
        ];
        for failure in &failures {
            assert_eq!(
                is_retryable(failure, &policy),
                is_retryable(failure, &policy)
            );
        }
    }

    #[test]
    fn test_predicates() {
        let failure = Failure::status(404, "not found");
        assert!(AlwaysRetry.should_retry(&failure));
        assert!(!NeverRetry.should_retry(&failure));
        assert!(!DefaultClassifier::default().should_retry(&failure));
        assert!(DefaultClassifier::with_codes([404]).should_retry(&failure));

        let closure = ClosurePredicate::new(|f: &Failure| f.status_code() == Some(404));
        assert!(closure.should_retry(&failure));

        let shared = ShouldRetry::from_predicate(NeverRetry);
        assert!(!shared.clone().should_retry(&failure));
    }
}
