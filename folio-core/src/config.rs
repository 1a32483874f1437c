//! Configuration management for the Folio edit shell

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{FolioError, Result};

/// Environment variables recognised by [`Config::apply_environment_overrides`]
pub const ENV_PREFIX: &str = "FOLIO_";

/// Main system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub autosave: AutosaveConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FolioError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| FolioError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| FolioError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| FolioError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load from `path` when it exists, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                tracing::info!("Loading configuration from: {}", path.display());
                Self::from_file(path)
            }
            Some(path) => {
                tracing::debug!(
                    "Configuration file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::new())
            }
            None => Ok(Self::new()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.autosave.mode == AutosaveMode::AfterDelay && self.autosave.delay_ms == 0 {
            return Err(FolioError::Config(
                "autosave.delay_ms must be greater than zero when autosave is enabled"
                    .to_string(),
            ));
        }

        if self.storage.notebooks_dir.as_os_str().is_empty() {
            return Err(FolioError::Config(
                "storage.notebooks_dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Collect `FOLIO_*` variables from the process environment
    pub fn environment_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }

    /// Apply environment variable overrides
    pub fn apply_environment_overrides(
        &mut self,
        env_overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (key, value) in env_overrides {
            match key.as_str() {
                "FOLIO_APP_TITLE" => self.app.app_title = value.clone(),
                "FOLIO_STATIC_MODE" => {
                    self.app.static_mode = parse_bool(key, value)?;
                }
                "FOLIO_AUTOSAVE_MODE" => {
                    self.autosave.mode = match value.as_str() {
                        "after_delay" => AutosaveMode::AfterDelay,
                        "off" => AutosaveMode::Off,
                        other => {
                            return Err(FolioError::Config(format!(
                                "Invalid autosave mode in environment variable: {}",
                                other
                            )))
                        }
                    };
                }
                "FOLIO_AUTOSAVE_DELAY_MS" => {
                    self.autosave.delay_ms = value.parse().map_err(|_| {
                        FolioError::Config(format!(
                            "Invalid delay in environment variable: {}",
                            value
                        ))
                    })?;
                }
                "FOLIO_FORMAT_ON_SAVE" => {
                    self.autosave.format_on_save = parse_bool(key, value)?;
                }
                "FOLIO_NOTEBOOKS_DIR" => {
                    self.storage.notebooks_dir = PathBuf::from(value);
                }
                _ => {
                    // Ignore unknown environment variables
                }
            }
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value.parse().map_err(|_| {
        FolioError::Config(format!("Invalid boolean in {}: {}", key, value))
    })
}

/// Application-level display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Title that takes precedence over the filename when non-empty
    pub app_title: String,
    /// Read-only rendering; unload is never intercepted
    pub static_mode: bool,
}

/// When autosave fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AutosaveMode {
    /// Save once edits have been quiet for `delay_ms`
    #[default]
    AfterDelay,
    Off,
}

/// Autosave and save-side-effect settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    pub mode: AutosaveMode,
    /// Quiet period before an autosave, in milliseconds
    pub delay_ms: u64,
    /// Reformat all cells after a user-initiated save
    pub format_on_save: bool,
}

impl AutosaveConfig {
    pub fn is_enabled(&self) -> bool {
        self.mode == AutosaveMode::AfterDelay
    }

    pub fn delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.delay_ms)
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            mode: AutosaveMode::AfterDelay,
            delay_ms: 1000,
            format_on_save: false,
        }
    }
}

/// Where the file backend keeps notebooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub notebooks_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            notebooks_dir: PathBuf::from("notebooks"),
        }
    }
}
