//! CLI command handlers.

pub mod config;
pub mod demo;
pub mod soak;
pub mod watch;

use lapse_config::LoadedConfig;
use lapse_session::StoreConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Effective configuration, CLI overrides applied.
    pub loaded: LoadedConfig,
}

impl Context {
    /// Store settings derived from the `[session]` section.
    pub fn store_config(&self) -> StoreConfig {
        let session = self.loaded.config.session();
        StoreConfig::new()
            .with_max_age(session.max_age())
            .with_sweep_interval(session.sweep_interval())
            .with_event_capacity(session.event_capacity)
    }
}
