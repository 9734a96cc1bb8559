//! # oplink-config
//!
//! Client configuration with layered sources: compiled defaults, an
//! optional JSON config file deep-merged over them, and `OPLINK_*`
//! environment variable overrides on top.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{ConfigError, Result};
pub use loader::{load_config, load_config_from_path};
pub use types::Config;
