use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ChunkerError, Result};

/// Default output directory, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Default maximum chunk duration in minutes
pub const DEFAULT_MAX_DURATION_MINUTES: u32 = 20;

/// Default maximum chunk size in megabytes (MiB)
pub const DEFAULT_MAX_SIZE_MB: f64 = 19.5;

/// Windows at or below this duration are never shrunk
pub const MIN_WINDOW_MS: u64 = 60_000;

const MS_PER_MINUTE: u64 = 60 * 1000;
/// Binary megabyte used for every size limit
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// What to do when an encoded window overshoots the size limit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShrinkPolicy {
    /// Shrink by 10% once and keep the result, even if still oversized
    #[default]
    Once,
    /// Keep shrinking by 10% until the file fits or the window hits the floor
    Converge,
}

impl ShrinkPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShrinkPolicy::Once => "once",
            ShrinkPolicy::Converge => "converge",
        }
    }

    pub fn all() -> &'static [ShrinkPolicy] {
        &[ShrinkPolicy::Once, ShrinkPolicy::Converge]
    }
}

impl fmt::Display for ShrinkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ShrinkPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "once" | "single" => Ok(ShrinkPolicy::Once),
            "converge" | "repeat" => Ok(ShrinkPolicy::Converge),
            _ => Err(format!(
                "Unknown shrink policy: {}. Available: once, converge",
                s
            )),
        }
    }
}

/// Immutable configuration for one splitting run.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitConfig {
    pub max_duration_ms: u64,
    pub max_size_bytes: u64,
    pub output_dir: PathBuf,
    /// Prefix for every output filename (`{base_name}_partNNN.m4a`)
    pub base_name: String,
    pub shrink_policy: ShrinkPolicy,
}

impl SplitConfig {
    /// Build a config from the user-facing minutes/megabytes limits.
    ///
    /// Megabytes are binary (1 MB = 1024 * 1024 bytes) and truncated to whole
    /// bytes. Values are not validated here; `validate` runs at split time.
    pub fn from_limits(
        output_dir: impl Into<PathBuf>,
        base_name: impl Into<String>,
        max_duration_minutes: u32,
        max_size_mb: f64,
    ) -> Self {
        let max_size_bytes = if max_size_mb.is_finite() && max_size_mb > 0.0 {
            (max_size_mb * BYTES_PER_MB) as u64
        } else {
            0
        };

        Self {
            max_duration_ms: u64::from(max_duration_minutes) * MS_PER_MINUTE,
            max_size_bytes,
            output_dir: output_dir.into(),
            base_name: base_name.into(),
            shrink_policy: ShrinkPolicy::default(),
        }
    }

    /// Config with default limits, naming chunks after the input file stem.
    pub fn for_input(input: &Path) -> Self {
        Self::from_limits(
            DEFAULT_OUTPUT_DIR,
            base_name_for(input),
            DEFAULT_MAX_DURATION_MINUTES,
            DEFAULT_MAX_SIZE_MB,
        )
    }

    pub fn with_shrink_policy(mut self, policy: ShrinkPolicy) -> Self {
        self.shrink_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_duration_ms == 0 {
            return Err(ChunkerError::InvalidConfig(
                "maximum duration must be greater than zero".to_string(),
            ));
        }
        if self.max_size_bytes == 0 {
            return Err(ChunkerError::InvalidConfig(
                "maximum size must be greater than zero".to_string(),
            ));
        }
        if self.base_name.trim().is_empty() {
            return Err(ChunkerError::InvalidConfig(
                "base name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the chunk with the given 1-based index.
    pub fn chunk_path(&self, index: usize, extension: &str) -> PathBuf {
        self.output_dir
            .join(chunk_filename(&self.base_name, index, extension))
    }
}

/// `{base}_part{NNN}.{ext}`, zero-padded to three digits.
pub fn chunk_filename(base_name: &str, index: usize, extension: &str) -> String {
    format!("{base_name}_part{index:03}.{extension}")
}

/// File stem of the input, used as the default chunk prefix.
pub fn base_name_for(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio")
        .to_string()
}
