//! Configuration management for manga-creator.
//!
//! Configuration is loaded from `~/.config/manga-creator/config.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the configured endpoint.
pub const ENDPOINT_ENV: &str = "MANGA_CREATOR_ENDPOINT";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL the prompt is POSTed to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout. Requests wait indefinitely when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Display settings.
    #[serde(default)]
    pub ui: UiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: None,
            ui: UiConfig::default(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:3000/api/generate".to_string()
}

/// Text shown by the TUI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Title of the prompt box.
    #[serde(default = "default_title")]
    pub title: String,
    /// Hint shown while the prompt is empty.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            placeholder: default_placeholder(),
        }
    }
}

fn default_title() -> String {
    "Manga Creator".to_string()
}

fn default_placeholder() -> String {
    "Enter your manga idea...".to_string()
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("manga-creator"))
            .context("Could not determine config directory")
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the log file path used while the TUI owns the terminal.
    pub fn log_path() -> Result<PathBuf> {
        dirs::cache_dir()
            .map(|p| p.join("manga-creator").join("manga-creator.log"))
            .context("Could not determine cache directory")
    }

    /// Load configuration from file, using defaults if not found.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path, using defaults if not found.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply endpoint overrides: the CLI flag beats the environment, which
    /// beats the file.
    pub fn with_overrides(mut self, cli_endpoint: Option<String>, env_endpoint: Option<String>) -> Self {
        if let Some(endpoint) = cli_endpoint.or(env_endpoint) {
            self.endpoint = endpoint;
        }
        self
    }

    /// Request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
