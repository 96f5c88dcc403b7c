//! Schedule command

use anyhow::{Context, Result};
use camino::Utf8Path;
use rebound_core::retry::{schedule, JitterSource, NoJitter, SeededJitter, ThreadRngJitter};
use rebound_core::types::RetryPolicy;
use serde::Serialize;

use crate::cli::ScheduleArgs;
use crate::output;

/// Backoff delays for one policy
#[derive(Debug, Serialize)]
struct ScheduleReport {
    max_attempts: u32,
    delays_ms: Vec<u64>,
    total_ms: u64,
}

impl ScheduleReport {
    fn build(policy: &RetryPolicy, jitter: &dyn JitterSource) -> Self {
        let delays_ms: Vec<u64> = schedule(policy, jitter)
            .into_iter()
            .map(|d| d.as_millis() as u64)
            .collect();
        let total_ms = delays_ms.iter().sum();
        Self {
            max_attempts: policy.attempts(),
            delays_ms,
            total_ms,
        }
    }
}

pub fn run(args: ScheduleArgs, config_dir: Option<&Utf8Path>) -> Result<()> {
    let config = super::loader(config_dir)?
        .load()
        .context("Failed to load configuration")?;
    let policy = args.policy.apply(config.policy_for(&args.policy.operation));
    policy.validate().context("Invalid retry policy")?;

    let jitter: Box<dyn JitterSource> = match (args.seed, args.no_jitter) {
        (_, true) => Box::new(NoJitter),
        (Some(seed), false) => Box::new(SeededJitter::new(seed)),
        (None, false) => Box::new(ThreadRngJitter),
    };
    let report = ScheduleReport::build(&policy, jitter.as_ref());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::header(&format!("Backoff schedule for '{}'", args.policy.operation));
    output::kv("Attempts", &report.max_attempts.to_string());
    for (i, delay) in report.delays_ms.iter().enumerate() {
        output::kv(&format!("Before attempt {}", i + 2), &format!("{}ms", delay));
    }
    output::kv("Total", &format!("{}ms", report.total_ms));
    Ok(())
}
