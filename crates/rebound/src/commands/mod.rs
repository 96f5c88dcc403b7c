//! Command implementations

pub mod config;
pub mod fetch;
pub mod schedule;

use anyhow::{Context, Result};
use camino::Utf8Path;
use rebound_core::config::HierarchicalConfigLoader;

/// Resolve the config loader from the global `--config-dir` flag
pub(crate) fn loader(config_dir: Option<&Utf8Path>) -> Result<HierarchicalConfigLoader> {
    match config_dir {
        Some(dir) => Ok(HierarchicalConfigLoader::with_dir(dir.to_path_buf())),
        None => HierarchicalConfigLoader::new().context("Failed to locate config directory"),
    }
}
