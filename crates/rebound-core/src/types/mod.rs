//! Type definitions for Rebound retry policies and runtime configuration

mod policy;
mod runtime_config;

pub use policy::*;
pub use runtime_config::*;
