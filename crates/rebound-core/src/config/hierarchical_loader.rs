//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. Config file (~/.rebound/config.yaml)
//! 3. Environment variables (REBOUND_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{ReboundConfig, RetryPoliciesConfig};
use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use std::env;
use std::fs;

/// Name of the configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a loader rooted at the standard config directory
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the standard config directory (~/.rebound)
    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| Error::invalid_config(format!("Home directory is not UTF-8: {:?}", p)))?;
        Ok(home.join(".rebound"))
    }

    /// Load configuration with hierarchical precedence
    pub fn load(&self) -> Result<ReboundConfig> {
        let mut config = ReboundConfig::default();

        let config_path = self.config_path();
        if config_path.exists() {
            let file_config = self.load_yaml_file::<ReboundConfig>(&config_path)?;
            config = Self::merge_config(config, file_config);
        }

        config = self.apply_env_overrides(config)?;
        config.validate()?;

        tracing::debug!(path = %config_path, "loaded configuration");
        Ok(config)
    }

    /// Load a single YAML file without defaults or environment overrides
    pub fn load_file(path: &Utf8Path) -> Result<ReboundConfig> {
        if !path.exists() {
            return Err(Error::config_not_found(path.as_str()));
        }
        let content = fs::read_to_string(path)?;
        let config: ReboundConfig = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let config: T = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        Ok(config)
    }

    /// Merge two configs (base is overridden by overlay)
    fn merge_config(base: ReboundConfig, overlay: ReboundConfig) -> ReboundConfig {
        ReboundConfig {
            http: overlay.http,
            retry: Self::merge_retry_policies(base.retry, overlay.retry),
        }
    }

    /// Merge retry policies
    fn merge_retry_policies(
        mut base: RetryPoliciesConfig,
        overlay: RetryPoliciesConfig,
    ) -> RetryPoliciesConfig {
        for (key, policy) in overlay.operations {
            base.operations.insert(key, policy);
        }
        base.default = overlay.default;
        base
    }

    /// Apply environment variable overrides to the default policy and HTTP settings
    fn apply_env_overrides(&self, mut config: ReboundConfig) -> Result<ReboundConfig> {
        let policy = &mut config.retry.default;

        if let Ok(val) = env::var("REBOUND_MAX_ATTEMPTS") {
            policy.max_attempts = val.parse().map_err(|_| {
                Error::invalid_config("REBOUND_MAX_ATTEMPTS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("REBOUND_INITIAL_DELAY_MS") {
            policy.initial_delay_ms = val.parse().map_err(|_| {
                Error::invalid_config("REBOUND_INITIAL_DELAY_MS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("REBOUND_MAX_DELAY_MS") {
            policy.max_delay_ms = val.parse().map_err(|_| {
                Error::invalid_config("REBOUND_MAX_DELAY_MS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("REBOUND_BACKOFF_MULTIPLIER") {
            policy.backoff_multiplier = val.parse().map_err(|_| {
                Error::invalid_config("REBOUND_BACKOFF_MULTIPLIER must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("REBOUND_RETRYABLE_STATUS_CODES") {
            policy.retryable_status_codes = parse_status_codes(&val)?.into_iter().collect();
        }

        if let Ok(val) = env::var("REBOUND_HTTP_TIMEOUT_SECS") {
            config.http.timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("REBOUND_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the config file path
    pub fn config_path(&self) -> Utf8PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }
}

/// Parse a comma-separated list of status codes, e.g. `"429, 503"`
pub fn parse_status_codes(value: &str) -> Result<Vec<u16>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            code.parse::<u16>()
                .ok()
                .filter(|status| (100..=599).contains(status))
                .ok_or_else(|| Error::invalid_config(format!("Invalid status code: {}", code)))
        })
        .collect()
}
