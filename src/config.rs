// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::{DEFAULT_CRF, FfmpegTools, QualityPreset};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub tools: FfmpegTools,

    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Encoder speed/quality preset
    #[serde(default)]
    pub quality: QualityPreset,

    /// Constant rate factor, 0-51 (lower is better quality)
    #[serde(default = "default_crf")]
    pub crf: i32,

    /// Concurrent encodes; 0 means one per CPU
    #[serde(default)]
    pub threads: usize,

    /// Probe for GPU encoders before falling back to libx264
    #[serde(default = "default_true_config")]
    pub use_hardware: bool,

    /// Re-encode inputs whose output file already exists
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Minimum time between progress redraws of one job
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

fn default_crf() -> i32 {
    i32::from(DEFAULT_CRF)
}

fn default_true_config() -> bool {
    true
}

fn default_refresh_interval_ms() -> u64 {
    500
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            quality: QualityPreset::default(),
            crf: default_crf(),
            threads: 0,
            use_hardware: true,
            overwrite: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

impl DisplayConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("lutbatch")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("lutbatch")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the default location; a missing file yields the defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Create a default config file if it doesn't exist.
    /// Returns true when a new file was written.
    pub fn ensure_default() -> Result<bool> {
        if Self::exists() {
            return Ok(false);
        }
        Config::default().save()?;
        Ok(true)
    }
}
