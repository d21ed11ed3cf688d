//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/locpick/locpick.toml`
//! 3. Explicit config file: `--config <file>`
//! 4. Environment variables: `LOCPICK_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::DEFAULT_PROBE_CONCURRENCY;
use crate::application::{ApplicationError, DEFAULT_MAX_JUSTIFICATION_LEN};

/// Node loader configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Cap on classification probes in flight per tree level, 0 for none
    pub probe_concurrency: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
        }
    }
}

/// Picker form configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PickerConfig {
    /// Maximum justification length in characters
    pub max_justification_len: usize,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            max_justification_len: DEFAULT_MAX_JUSTIFICATION_LEN,
        }
    }
}

/// Raw settings for intermediate parsing (Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub fixture: Option<PathBuf>,
    pub loader: RawLoaderConfig,
    pub picker: RawPickerConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLoaderConfig {
    pub probe_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawPickerConfig {
    pub max_justification_len: Option<usize>,
}

/// Unified configuration for locpick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Directory fixture backing the offline collaborators
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture: Option<PathBuf>,
    pub loader: LoaderConfig,
    pub picker: PickerConfig,
}

/// Get the XDG config directory for locpick.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "locpick").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("locpick.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}` in a path, leaving it untouched on failure.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            fixture: overlay.fixture.clone().or_else(|| self.fixture.clone()),
            loader: LoaderConfig {
                probe_concurrency: overlay
                    .loader
                    .probe_concurrency
                    .unwrap_or(self.loader.probe_concurrency),
            },
            picker: PickerConfig {
                max_justification_len: overlay
                    .picker
                    .max_justification_len
                    .unwrap_or(self.picker.max_justification_len),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; it must exist when given
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/locpick/locpick.toml`
    /// 3. Explicit config file
    /// 4. Environment variables: `LOCPICK_*` prefix, `__` between sections
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.fixture = current.fixture.as_deref().map(expand_path);
        current.validate()?;

        Ok(current)
    }

    /// Apply LOCPICK_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("LOCPICK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("fixture") {
            settings.fixture = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get::<usize>("loader.probe_concurrency") {
            settings.loader.probe_concurrency = val;
        }
        if let Ok(val) = config.get::<usize>("picker.max_justification_len") {
            settings.picker.max_justification_len = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.picker.max_justification_len == 0 {
            return Err(ApplicationError::Config {
                message: "picker.max_justification_len must be positive".into(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# locpick configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/locpick/locpick.toml
#   Local:  file passed with --config
#   Env:    LOCPICK_* environment variables, e.g. LOCPICK_LOADER__PROBE_CONCURRENCY=4

# Directory fixture used by the offline collaborators
# fixture = "~/locations.toml"

[loader]
# Cap on classification probes in flight per tree level (0: probe all siblings at once)
# probe_concurrency = 0

[picker]
# Maximum justification length in characters
# max_justification_len = 500
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
