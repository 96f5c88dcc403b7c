//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use rebound_core::types::RetryPolicy;
use rebound_http::Method;
use std::time::Duration;

/// Rebound - retry transient failures with capped exponential backoff
#[derive(Parser, Debug)]
#[command(name = "rebound")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding config.yaml (default: ~/.rebound)
    #[arg(long, global = true, env = "REBOUND_CONFIG_DIR")]
    pub config_dir: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send an HTTP request through the retrying client
    Fetch(FetchArgs),

    /// Print the backoff delays a policy would produce
    Schedule(ScheduleArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Policy overrides shared by commands that resolve a retry policy
#[derive(Args, Debug, Default, Clone)]
pub struct PolicyArgs {
    /// Named operation whose configured policy is used as the base
    #[arg(long, default_value = "fetch")]
    pub operation: String,

    /// Total attempts, including the first
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Delay before the second attempt, in milliseconds
    #[arg(long)]
    pub initial_delay_ms: Option<u64>,

    /// Upper bound on any single delay, in milliseconds
    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Growth factor between consecutive delays
    #[arg(long)]
    pub backoff_multiplier: Option<f64>,
}

impl PolicyArgs {
    /// Apply flag overrides on top of a configured policy
    pub fn apply(&self, policy: &RetryPolicy) -> RetryPolicy {
        let mut policy = policy.clone();
        if let Some(n) = self.max_attempts {
            policy = policy.with_max_attempts(n);
        }
        if let Some(ms) = self.initial_delay_ms {
            policy = policy.with_initial_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.max_delay_ms {
            policy = policy.with_max_delay(Duration::from_millis(ms));
        }
        if let Some(m) = self.backoff_multiplier {
            policy = policy.with_backoff_multiplier(m);
        }
        policy
    }
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// URL to request
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: Method,

    /// Request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Extra header, as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Give up after this many seconds, including backoff sleeps
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Only retry these methods (repeatable; default: all)
    #[arg(long = "retry-method")]
    pub retry_methods: Vec<Method>,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Seed the jitter source for a reproducible schedule
    #[arg(long, conflicts_with = "no_jitter")]
    pub seed: Option<u64>,

    /// Print the base delays without jitter
    #[arg(long)]
    pub no_jitter: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration
    Show(ConfigShowArgs),

    /// Print the configuration file path
    Path,
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
