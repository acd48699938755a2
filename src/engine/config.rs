//! Engine configuration.
//!
//! Everything here is fixed at construction; nothing is mutable once the
//! engine is running.

use crate::random::DEFAULT_CACHE_SIZE;
use crate::synthesis::DEFAULT_RECORDS_PER_DAY;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Waveform synthesis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Samples per second.
    pub sample_rate_hz: u32,
    /// Length of each record in seconds.
    pub record_duration_secs: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 250,
            record_duration_secs: 5,
        }
    }
}

impl SynthesisConfig {
    /// Fixed sample count of every record.
    pub fn samples_per_record(&self) -> usize {
        self.sample_rate_hz as usize * self.record_duration_secs as usize
    }
}

/// Progressive loading parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Records to generate in total.
    pub total_records: usize,
    /// Records produced eagerly before the background loop starts.
    pub initial_load_count: usize,
    /// Records per frame tick during the initial burst.
    pub initial_batch_size: usize,
    /// Records per idle tick during background fill.
    pub background_batch_size: usize,
    /// Distance from the frontier that re-triggers background fill.
    pub lookahead: usize,
    /// Start background fill as soon as the initial burst finishes.
    pub auto_background: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            total_records: 100,
            initial_load_count: 10,
            initial_batch_size: 2,
            background_batch_size: 10,
            lookahead: 5,
            auto_background: true,
        }
    }
}

/// Timestamp assignment parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampConfig {
    /// First working date. Defaults to the first of the month three
    /// months before today.
    pub anchor: Option<NaiveDate>,
    /// Records sharing one calendar offset.
    pub records_per_day: u64,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            anchor: None,
            records_per_day: DEFAULT_RECORDS_PER_DAY,
        }
    }
}

/// Random cache parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomConfig {
    /// Words drawn from the entropy source per refill.
    pub cache_size: usize,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

/// Host pacing for the CLI driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Delay before each initial-burst batch.
    pub frame_interval_ms: u64,
    /// Fallback delay before each background batch.
    pub idle_fallback_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            idle_fallback_ms: 100,
        }
    }
}

impl PacingConfig {
    /// Frame interval as a duration.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Idle fallback as a duration.
    pub fn idle_fallback(&self) -> Duration {
        Duration::from_millis(self.idle_fallback_ms)
    }
}

/// Full engine configuration, also the TOML file format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub timestamps: TimestampConfig,
    #[serde(default)]
    pub random: RandomConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

impl EngineConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.synthesis.sample_rate_hz == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if self.synthesis.record_duration_secs == 0 {
            return Err(ConfigError::InvalidDuration);
        }
        if self.loader.initial_batch_size == 0 || self.loader.background_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.random.cache_size == 0 {
            return Err(ConfigError::InvalidCacheSize);
        }
        if self.timestamps.records_per_day == 0 {
            return Err(ConfigError::InvalidRecordsPerDay);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("sample rate must be at least 1 Hz")]
    InvalidSampleRate,
    #[error("record duration must be at least 1 second")]
    InvalidDuration,
    #[error("batch sizes must be non-zero")]
    InvalidBatchSize,
    #[error("random cache size must be non-zero")]
    InvalidCacheSize,
    #[error("records per day must be non-zero")]
    InvalidRecordsPerDay,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}
