//! CLI configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via STATEWRIGHT_CONFIG or --config)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    IoError(PathBuf, std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),
}

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Hook binding configuration.
    pub hooks: HooksConfig,
    /// REPL configuration.
    pub repl: ReplConfig,
}

impl Config {
    /// Loads configuration from `path` (or STATEWRIGHT_CONFIG), then applies
    /// environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match std::env::var("STATEWRIGHT_CONFIG") {
                Ok(path) => Self::from_file(path)?,
                Err(_) => Self::default(),
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.logging.apply_env_overrides();
        self.hooks.apply_env_overrides();
        self.repl.apply_env_overrides();
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(filter) = std::env::var("STATEWRIGHT_LOG") {
            self.filter = filter;
        }
    }
}

/// Hook binding configuration.
///
/// The CLI has no domain objects, so every bound hook just reports that it
/// ran.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    /// Hook names to bind.
    pub names: Vec<String>,
    /// Bind every hook name the definition references.
    pub auto_bind: bool,
}

impl HooksConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("STATEWRIGHT_AUTO_BIND") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.auto_bind = true,
                "0" | "false" | "no" => self.auto_bind = false,
                _ => {}
            }
        }
    }
}

/// REPL configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// History file. Defaults to ~/.statewright_history.
    pub history_file: Option<PathBuf>,
    /// Prompt text.
    pub prompt: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            history_file: None,
            prompt: "statewright>".to_string(),
        }
    }
}

impl ReplConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("STATEWRIGHT_HISTORY") {
            self.history_file = Some(PathBuf::from(path));
        }
    }

    /// Resolves the history file path.
    pub fn history_path(&self) -> PathBuf {
        if let Some(path) = &self.history_file {
            return path.clone();
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".statewright_history"))
            .unwrap_or_else(|_| ".statewright_history".into())
    }
}
