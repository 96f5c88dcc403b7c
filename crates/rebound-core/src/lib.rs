//! # rebound-core
//!
//! Core library for Rebound providing:
//! - Retry policy types and their YAML/env configuration
//! - Failure descriptors and the retryability classifier
//! - Exponential backoff with injectable jitter
//! - The retry executor, its observers, and a generic callable wrapper

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::{HierarchicalConfigLoader, ReboundConfig};
pub use error::{Error, Result};
pub use types::RetryPolicy;
