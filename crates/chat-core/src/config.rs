use crate::error::ConfigError;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level analysis configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub timezone: TimezoneConfig,
    pub output: OutputConfig,
    pub charts: ChartConfig,
}

impl AnalysisConfig {
    /// Load configuration from the default path (~/.config/chat-analysis/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents)?;
        config.timezone.offset()?;
        Ok(config)
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chat-analysis")
            .join("config.toml")
    }
}

/// Timezone used to assign timestamps to calendar buckets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    /// Fixed offset east of UTC, in minutes. Zero buckets in UTC.
    pub utc_offset_minutes: i32,
}

impl TimezoneConfig {
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidOffset(self.utc_offset_minutes))
    }
}

/// Where run directories are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Parent directory for per-run output directories.
    pub root: PathBuf,
    /// Run directories are named `<dir_prefix>_<YYYYmmdd_HHMMSS>`.
    pub dir_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            dir_prefix: "chat_analysis".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    /// Models drawn individually on the usage chart; the rest share one line.
    pub max_models: usize,
    /// Upper bound on gap-filled buckets per chart.
    pub max_buckets: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 800,
            max_models: 8,
            max_buckets: 2000,
        }
    }
}
