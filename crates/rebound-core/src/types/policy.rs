//! Retry policy configuration
//!
//! A [`RetryPolicy`] is immutable once an invocation starts. It is cheap to
//! clone and safe to share between concurrent invocations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::retry::{Failure, ShouldRetry};

/// Status codes retried by default: 408, 429, 500, 502, 503, 504
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Retry policy for an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound on the un-jittered delay, in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Growth factor applied per failed attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// HTTP-like status codes considered transient
    #[serde(default = "default_retryable_status_codes")]
    pub retryable_status_codes: BTreeSet<u16>,

    /// Full override of the default classification rules
    #[serde(skip)]
    pub should_retry: Option<ShouldRetry>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            retryable_status_codes: default_retryable_status_codes(),
            should_retry: None,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    10000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_retryable_status_codes() -> BTreeSet<u16> {
    DEFAULT_RETRYABLE_STATUS_CODES.into_iter().collect()
}

impl RetryPolicy {
    /// Set the maximum number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the delay cap
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Replace the set of retryable status codes
    pub fn with_retryable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_status_codes = codes.into_iter().collect();
        self
    }

    /// Install a predicate that replaces the default classification rules
    pub fn with_should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Failure) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(ShouldRetry::new(predicate));
        self
    }

    /// Initial delay as a `Duration`
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Delay cap as a `Duration`
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Number of attempts the executor will make. Never less than one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Whether `status` belongs to the retryable set
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }

    /// Check the numeric constraints on the policy
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_policy("max-attempts must be at least 1"));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::invalid_policy(format!(
                "backoff-multiplier must be a finite number >= 1, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay(), Duration::from_secs(1));
        assert_eq!(policy.max_delay(), Duration::from_secs(10));
        assert_eq!(policy.backoff_multiplier, 2.0);
        assert_eq!(
            policy.retryable_status_codes.iter().copied().collect::<Vec<_>>(),
            vec![408, 429, 500, 502, 503, 504]
        );
        assert!(policy.should_retry.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let policy = RetryPolicy::default().with_max_attempts(0);
        assert!(policy.validate().is_err());
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn test_oversized_delay_saturates() {
        let policy = RetryPolicy::default()
            .with_initial_delay(Duration::from_millis(1500))
            .with_max_delay(Duration::MAX);
        assert_eq!(policy.initial_delay_ms, 1500);
        assert_eq!(policy.max_delay_ms, u64::MAX);
    }

    #[test]
    fn test_validate_rejects_shrinking_multiplier() {
        assert!(RetryPolicy::default()
            .with_backoff_multiplier(0.5)
            .validate()
            .is_err());
        assert!(RetryPolicy::default()
            .with_backoff_multiplier(f64::NAN)
            .validate()
            .is_err());
        assert!(RetryPolicy::default()
            .with_backoff_multiplier(1.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let yaml = r#"
max-attempts: 5
retryable-status-codes: [503]
"#;
        let policy: RetryPolicy = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay_ms, 1000);
        assert!(policy.is_retryable_status(503));
        assert!(!policy.is_retryable_status(500));
    }

    #[test]
    fn test_should_retry_is_not_serialized() {
        let policy = RetryPolicy::default().with_should_retry(|_| true);
        let yaml = serde_yaml_ng::to_string(&policy).unwrap();
        assert!(!yaml.contains("should-retry"));
        assert!(yaml.contains("max-attempts: 3"));
    }
}
