//! Configuration system for the lapse session store.
//!
//! Provides TOML-based configuration with:
//! - Session TTL and sweep settings (`[session]`)
//! - Log level, format and file output (`[logging]`)
//! - Config file layering (user config dir + project-local overrides + CLI flags)
//! - Validation of the TTL/sweep relationship

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigLayer, LayerStatus, LoadedConfig, SessionOverrides, default_config_dir, discover,
};
pub use error::{ConfigError, Result};
pub use types::*;
