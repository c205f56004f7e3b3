//! Configuration management for the CLI
//!
//! Values come from an optional JSON file at `~/.config/scout/config.json`,
//! then `SCOUT_*` environment variables, then command-line flags.

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use scout_lib::feed::{FeedConfig, DEFAULT_FEED_URL};
use scout_lib::SessionConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScoutConfig {
    /// Feed URL or path to a saved feed document
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Quiet period before the shell recomputes the filtered view
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Output format used when `--format` is not given
    #[serde(default)]
    pub default_format: Option<OutputFormat>,
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_debounce_ms() -> u64 {
    250
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            timeout_secs: default_timeout_secs(),
            debounce_ms: default_debounce_ms(),
            default_format: None,
        }
    }
}

impl ScoutConfig {
    /// Load configuration from the config file and environment
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Ok(path) => Self::load_from(Some(&path)),
            Err(_) => Self::load_from(None),
        }
    }

    fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(false),
            );
        }

        let config = builder
            .add_source(config::Environment::with_prefix("SCOUT"))
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Feed settings, with `--source` taking precedence over the config
    pub fn feed_config(&self, source: Option<&str>) -> FeedConfig {
        FeedConfig {
            location: source.unwrap_or(&self.feed_url).to_string(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            debounce_window: Duration::from_millis(self.debounce_ms),
        }
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("scout").join("config.json"))
    }
}
