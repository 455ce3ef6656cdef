//! Persisted default limits for the command-line front end.
//!
//! Stored as JSON at `<config_dir>/audiosplit/settings.json`. A missing or
//! unreadable file is not an error; the built-in defaults are used instead.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{
    DEFAULT_MAX_DURATION_MINUTES, DEFAULT_MAX_SIZE_MB, DEFAULT_OUTPUT_DIR, ShrinkPolicy,
    SplitConfig,
};
use crate::audio::DEFAULT_BITRATE;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Directory chunks are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum chunk duration in minutes
    #[serde(default = "default_max_duration_minutes")]
    pub max_duration_minutes: u32,

    /// Maximum chunk size in MB (binary megabytes)
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: f64,

    #[serde(default)]
    pub shrink_policy: ShrinkPolicy,

    /// AAC bitrate handed to ffmpeg (e.g. "128k")
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_max_duration_minutes() -> u32 {
    DEFAULT_MAX_DURATION_MINUTES
}

fn default_max_size_mb() -> f64 {
    DEFAULT_MAX_SIZE_MB
}

fn default_bitrate() -> String {
    DEFAULT_BITRATE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_duration_minutes: default_max_duration_minutes(),
            max_size_mb: default_max_size_mb(),
            shrink_policy: ShrinkPolicy::default(),
            bitrate: default_bitrate(),
        }
    }
}

impl Settings {
    /// Default location of the settings file, if the platform has a config dir.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("audiosplit").join(SETTINGS_FILE))
    }

    /// Load settings from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from `path`, falling back to defaults on any failure.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring invalid settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save settings to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::path().context("No config directory available on this platform")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Build a run configuration for `base_name` from these settings.
    pub fn split_config(&self, base_name: impl Into<String>) -> SplitConfig {
        SplitConfig::from_limits(
            self.output_dir.clone(),
            base_name,
            self.max_duration_minutes,
            self.max_size_mb,
        )
        .with_shrink_policy(self.shrink_policy)
    }
}
