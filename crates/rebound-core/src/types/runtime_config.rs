//! Runtime configuration types
//!
//! These types define configuration that controls how Rebound talks to the
//! network: HTTP client settings and the retry policies per operation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::policy::RetryPolicy;
use crate::error::{Error, Result};

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReboundConfig {
    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry policy configurations
    #[serde(default)]
    pub retry: RetryPoliciesConfig,
}

impl ReboundConfig {
    /// Policy for `operation`, falling back to the default policy
    pub fn policy_for(&self, operation: &str) -> &RetryPolicy {
        self.retry
            .operations
            .get(operation)
            .unwrap_or(&self.retry.default)
    }

    /// Policy configured explicitly for `operation`
    pub fn operation_policy(&self, operation: &str) -> Result<&RetryPolicy> {
        self.retry
            .operations
            .get(operation)
            .ok_or_else(|| Error::unknown_operation(operation))
    }

    /// Validate every configured policy
    pub fn validate(&self) -> Result<()> {
        self.retry.default.validate()?;
        for (name, policy) in &self.retry.operations {
            policy.validate().map_err(|e| {
                Error::invalid_config(format!("retry.operations.{}: {}", name, e))
            })?;
        }
        Ok(())
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_user_agent() -> String {
    format!(
        "rebound/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Retry policy configurations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPoliciesConfig {
    /// Default retry policy
    #[serde(default)]
    pub default: RetryPolicy,

    /// Per-operation retry policies
    #[serde(default)]
    pub operations: HashMap<String, RetryPolicy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_for_falls_back_to_default() {
        let mut config = ReboundConfig::default();
        config.retry.operations.insert(
            "upload".to_string(),
            RetryPolicy::default().with_max_attempts(7),
        );

        assert_eq!(config.policy_for("upload").max_attempts, 7);
        assert_eq!(config.policy_for("download").max_attempts, 3);
        assert!(config.operation_policy("download").is_err());
    }

    #[test]
    fn test_validate_names_the_operation() {
        let mut config = ReboundConfig::default();
        config.retry.operations.insert(
            "broken".to_string(),
            RetryPolicy::default().with_max_attempts(0),
        );

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("retry.operations.broken"));
    }

    #[test]
    fn test_http_defaults() {
        let http = HttpConfig::default();
        assert_eq!(http.timeout_secs, 30);
        assert!(http.user_agent.starts_with("rebound/"));
    }
}
