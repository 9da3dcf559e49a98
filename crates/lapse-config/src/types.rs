//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [session]                # TTL and sweeper settings
//! [logging]                # log level, format and file output
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Upper bound for any duration setting: one year, in seconds.
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LapseConfig {
    /// Session store configuration.
    pub session: Option<SessionConfig>,

    /// Logging configuration.
    pub logging: Option<LoggingConfig>,
}

impl LapseConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: LapseConfig) {
        if other.session.is_some() {
            self.session = other.session;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Session settings, falling back to defaults.
    pub fn session(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }

    /// Logging settings, falling back to defaults.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Check the effective configuration.
    ///
    /// Returns non-fatal warnings; hard violations are errors.
    pub fn validate(&self) -> crate::Result<Vec<String>> {
        self.session().validate()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session store configuration.
///
/// Sessions not updated for `max_age_secs` are evicted by a sweeper that
/// runs every `sweep_interval_secs`.
///
/// ```toml
/// [session]
/// max_age_secs = 5
/// sweep_interval_secs = 1
/// event_capacity = 256
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle seconds after which a session is evicted.
    pub max_age_secs: u64,
    /// Seconds between sweeper passes.
    pub sweep_interval_secs: u64,
    /// Buffered eviction events per subscriber.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 5,
            sweep_interval_secs: 1,
            event_capacity: 256,
        }
    }
}

impl SessionConfig {
    /// Idle duration after which a session is evicted.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    /// Interval between sweeper passes.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate the TTL/sweep relationship.
    pub fn validate(&self) -> crate::Result<Vec<String>> {
        if self.max_age_secs == 0 {
            return Err(ConfigError::invalid(
                "session.max_age_secs",
                "must be greater than zero",
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "session.sweep_interval_secs",
                "must be greater than zero",
            ));
        }
        if self.max_age_secs > MAX_DURATION_SECS {
            return Err(ConfigError::invalid(
                "session.max_age_secs",
                format!("must not exceed {MAX_DURATION_SECS} (one year)"),
            ));
        }
        if self.sweep_interval_secs >= self.max_age_secs {
            return Err(ConfigError::invalid(
                "session.sweep_interval_secs",
                format!(
                    "must be smaller than max_age_secs ({})",
                    self.max_age_secs
                ),
            ));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::invalid(
                "session.event_capacity",
                "must be greater than zero",
            ));
        }

        let mut warnings = Vec::new();
        if self.sweep_interval_secs.saturating_mul(5) > self.max_age_secs {
            warnings.push(format!(
                "session.sweep_interval_secs ({}) is more than a fifth of max_age_secs ({}); \
                 sessions may outlive their TTL by up to {}s",
                self.sweep_interval_secs, self.max_age_secs, self.sweep_interval_secs
            ));
        }
        Ok(warnings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration.
///
/// ```toml
/// [logging]
/// level = "debug"
/// json = false
/// directory = "/var/log/lapse"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive for console output.
    pub level: String,
    /// Emit console logs as JSON lines.
    pub json: bool,
    /// Directory for daily-rotated JSON log files. No file output if unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
        }
    }
}
