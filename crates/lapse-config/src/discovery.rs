//! Config file discovery, layering and CLI overrides.
//!
//! Layers, lowest precedence first:
//! 1. `<config dir>/config.toml` (`--config-dir`, else the platform config dir + `lapse/`)
//! 2. `<project dir>/lapse.toml`
//! 3. CLI flags, applied with [`LoadedConfig::apply_overrides`]
//!
//! Sections merge whole: a layer's `[session]` replaces any earlier one.

use std::path::{Path, PathBuf};

use crate::{ConfigError, LapseConfig, Result};

const PROJECT_CONFIG_FILE: &str = "lapse.toml";
const USER_CONFIG_FILE: &str = "config.toml";

/// What happened to one config file during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerStatus {
    /// Parsed and merged.
    Loaded,
    /// No file at this path.
    Missing,
    /// Present but unreadable or unparsable; skipped.
    Rejected(String),
}

/// One config file considered during discovery.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub path: PathBuf,
    pub status: LayerStatus,
}

impl ConfigLayer {
    pub fn is_loaded(&self) -> bool {
        self.status == LayerStatus::Loaded
    }
}

/// Session values given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOverrides {
    pub max_age_secs: Option<u64>,
    pub sweep_interval_secs: Option<u64>,
}

impl SessionOverrides {
    fn is_empty(&self) -> bool {
        self.max_age_secs.is_none() && self.sweep_interval_secs.is_none()
    }
}

/// Merged configuration plus how it was assembled.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: LapseConfig,
    /// Every file considered, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
    /// Skipped layers, layers whose own `[session]` was invalid, loose settings.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of the layers that were merged.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.layers
            .iter()
            .filter(|l| l.is_loaded())
            .map(|l| l.path.as_path())
            .collect()
    }

    /// Apply CLI flags on top of every file layer.
    pub fn apply_overrides(&mut self, overrides: &SessionOverrides) {
        if overrides.is_empty() {
            return;
        }
        let mut session = self.config.session();
        if let Some(secs) = overrides.max_age_secs {
            session.max_age_secs = secs;
        }
        if let Some(secs) = overrides.sweep_interval_secs {
            session.sweep_interval_secs = secs;
        }
        self.config.session = Some(session);
    }

    /// Validate the final merged settings, appending non-fatal warnings.
    pub fn validate(&mut self) -> Result<()> {
        let warnings = self.config.validate()?;
        self.warnings.extend(warnings);
        Ok(())
    }
}

/// Discover and merge the user and project config files.
///
/// Never fails: a broken file is reported in `warnings` and skipped.
pub fn discover(config_dir: Option<&Path>, project_dir: &Path) -> LoadedConfig {
    let mut loaded = LoadedConfig {
        config: LapseConfig::new(),
        layers: Vec::new(),
        warnings: Vec::new(),
    };

    let user_path = config_dir
        .map(Path::to_path_buf)
        .or_else(default_config_dir)
        .map(|dir| dir.join(USER_CONFIG_FILE));
    if let Some(path) = user_path {
        merge_layer(&mut loaded, path);
    }
    merge_layer(&mut loaded, project_dir.join(PROJECT_CONFIG_FILE));

    loaded
}

/// Platform config directory for lapse, e.g. `~/.config/lapse`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lapse"))
}

fn merge_layer(loaded: &mut LoadedConfig, path: PathBuf) {
    let status = match read_layer(&path) {
        Ok(None) => LayerStatus::Missing,
        Ok(Some(layer)) => {
            // The layer may still be overridden, so this is only a warning here.
            if let Some(session) = &layer.session
                && let Err(e) = session.validate()
            {
                loaded
                    .warnings
                    .push(format!("{}: {}", path.display(), e));
            }
            loaded.config.merge(layer);
            LayerStatus::Loaded
        }
        Err(e) => {
            let reason = e.to_string();
            loaded
                .warnings
                .push(format!("Skipped {}: {}", path.display(), reason));
            LayerStatus::Rejected(reason)
        }
    };
    loaded.layers.push(ConfigLayer { path, status });
}

fn read_layer(path: &Path) -> Result<Option<LapseConfig>> {
    if !path.is_file() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    LapseConfig::from_toml(&contents).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    #[test]
    fn test_no_files_gives_defaults() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        let loaded = discover(Some(user.path()), project.path());
        assert_eq!(loaded.config, LapseConfig::default());
        assert_eq!(loaded.layers.len(), 2);
        assert!(loaded.layers.iter().all(|l| l.status == LayerStatus::Missing));
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_project_layer_overrides_user_layer() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(
            &user,
            "config.toml",
            "[session]\nmax_age_secs = 3600\nsweep_interval_secs = 60\n\n[logging]\nlevel = \"debug\"\n",
        );
        write(
            &project,
            "lapse.toml",
            "[session]\nmax_age_secs = 10\nsweep_interval_secs = 1\n",
        );

        let loaded = discover(Some(user.path()), project.path());
        assert_eq!(loaded.config.session().max_age_secs, 10);
        assert_eq!(loaded.config.session().sweep_interval_secs, 1);
        assert_eq!(loaded.config.logging().level, "debug");
        assert_eq!(loaded.loaded_from().len(), 2);
    }

    #[test]
    fn test_broken_layer_is_skipped_with_warning() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(&project, "lapse.toml", "not valid toml {{{{");

        let loaded = discover(Some(user.path()), project.path());
        assert!(loaded.loaded_from().is_empty());
        assert!(matches!(loaded.layers[1].status, LayerStatus::Rejected(_)));
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].starts_with("Skipped"));
    }

    #[test]
    fn test_invalid_layer_session_warns_but_later_layer_wins() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(
            &user,
            "config.toml",
            "[session]\nmax_age_secs = 5\nsweep_interval_secs = 5\n",
        );
        write(
            &project,
            "lapse.toml",
            "[session]\nmax_age_secs = 30\nsweep_interval_secs = 2\n",
        );

        let mut loaded = discover(Some(user.path()), project.path());
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("config.toml"));

        loaded.validate().unwrap();
        assert_eq!(loaded.warnings.len(), 1);
    }

    #[test]
    fn test_overrides_apply_on_top_of_files() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(
            &project,
            "lapse.toml",
            "[session]\nmax_age_secs = 120\nsweep_interval_secs = 10\n",
        );

        let mut loaded = discover(Some(user.path()), project.path());
        loaded.apply_overrides(&SessionOverrides {
            max_age_secs: Some(60),
            sweep_interval_secs: None,
        });

        assert_eq!(loaded.config.session().max_age_secs, 60);
        assert_eq!(loaded.config.session().sweep_interval_secs, 10);
    }

    #[test]
    fn test_validate_rejects_bad_override_and_collects_warnings() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        let mut loaded = discover(Some(user.path()), project.path());
        loaded.apply_overrides(&SessionOverrides {
            max_age_secs: Some(2),
            sweep_interval_secs: Some(2),
        });
        assert!(matches!(loaded.validate(), Err(ConfigError::Invalid { .. })));

        let mut loaded = discover(Some(user.path()), project.path());
        loaded.apply_overrides(&SessionOverrides {
            max_age_secs: Some(4),
            sweep_interval_secs: Some(2),
        });
        loaded.validate().unwrap();
        assert_eq!(loaded.warnings.len(), 1);
    }

    #[test]
    fn test_empty_overrides_keep_section_unset() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        let mut loaded = discover(Some(user.path()), project.path());
        loaded.apply_overrides(&SessionOverrides::default());
        assert!(loaded.config.session.is_none());
    }
}
