//! Configuration handling for todo-graph
//!
//! Configuration is stored in `config.toml` under the platform config
//! directory (e.g. `~/.config/todo-graph/config.toml`). Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::OutputFormat;
use crate::domain::SortKey;

/// File name of the task document when no path is configured
pub const DEFAULT_DATA_FILE: &str = "todos.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Task document; defaults to `todos.json` in the platform data directory
    pub data_file: Option<PathBuf>,

    /// Sort keys applied by `list` when none are given
    pub default_sort: Vec<SortKey>,

    /// Window for `upcoming` when `--days` is not given
    pub upcoming_days: i64,

    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: None,
            default_sort: vec![SortKey::Priority, SortKey::Deadline],
            upcoming_days: 7,
            default_format: OutputFormat::Text,
        }
    }
}

impl Config {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "todo-graph", "todo-graph")
    }

    /// Returns the global config directory
    pub fn config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the default config file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Loads configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to load config: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parses and validates TOML content
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.upcoming_days < 0 {
            return Err(ConfigError::Invalid(format!(
                "upcoming_days must not be negative, got {}",
                self.upcoming_days
            )));
        }
        if matches!(&self.data_file, Some(p) if p.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid("data_file must not be empty".into()));
        }
        Ok(())
    }

    /// Resolves the task document path
    ///
    /// Falls back to the platform data directory, then to the working directory.
    pub fn data_file(&self) -> PathBuf {
        if let Some(path) = &self.data_file {
            return path.clone();
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join(DEFAULT_DATA_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
    }

    /// Saves the configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }
}
