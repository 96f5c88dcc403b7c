//! Configuration loading and management

mod hierarchical_loader;

pub use crate::types::ReboundConfig;
pub use hierarchical_loader::{parse_status_codes, HierarchicalConfigLoader, CONFIG_FILE_NAME};
