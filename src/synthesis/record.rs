//! Synthesized record type and its metadata.

use super::rhythm::RhythmCategory;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Diagnosis label attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    /// Normal sinus rhythm.
    Normal,
    /// Sinus tachycardia.
    Tachycardia,
    /// Sinus bradycardia.
    Bradycardia,
    /// Irregular rhythm.
    Arrhythmia,
}

/// How prominently a diagnosis should be flagged to a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    Caution,
    Warning,
}

impl Diagnosis {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Diagnosis::Normal => "Normal sinus rhythm",
            Diagnosis::Tachycardia => "Sinus tachycardia",
            Diagnosis::Bradycardia => "Sinus bradycardia",
            Diagnosis::Arrhythmia => "Arrhythmia",
        }
    }

    /// Display severity: fast rhythms warn, slow or irregular ones caution.
    pub fn severity(self) -> Severity {
        match self {
            Diagnosis::Normal => Severity::Normal,
            Diagnosis::Tachycardia => Severity::Warning,
            Diagnosis::Bradycardia | Diagnosis::Arrhythmia => Severity::Caution,
        }
    }
}

impl From<RhythmCategory> for Diagnosis {
    fn from(category: RhythmCategory) -> Self {
        match category {
            RhythmCategory::Normal => Diagnosis::Normal,
            RhythmCategory::Tachycardia => Diagnosis::Tachycardia,
            RhythmCategory::Bradycardia => Diagnosis::Bradycardia,
            RhythmCategory::Arrhythmia => Diagnosis::Arrhythmia,
        }
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Signal quality flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Good,
    Fair,
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::Good => f.write_str("good"),
            Quality::Fair => f.write_str("fair"),
        }
    }
}

/// One synthesized waveform trace plus its metadata.
///
/// Records are immutable once built; the store hands out shared
/// references only.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Sequence index (generation order).
    index: u64,
    /// Amplitude samples, unitless.
    samples: Vec<f32>,
    /// Rounded heart rate in bpm.
    heart_rate: u32,
    /// Diagnosis label.
    diagnosis: Diagnosis,
    /// Local wall-clock acquisition time.
    timestamp: NaiveDateTime,
    /// Signal quality flag.
    quality: Quality,
}

impl Record {
    /// Creates a record from finished parts.
    pub fn new(
        index: u64,
        samples: Vec<f32>,
        heart_rate: u32,
        diagnosis: Diagnosis,
        timestamp: NaiveDateTime,
        quality: Quality,
    ) -> Self {
        Self {
            index,
            samples,
            heart_rate,
            diagnosis,
            timestamp,
            quality,
        }
    }

    /// Returns the sequence index.
    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Returns the sample array.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Returns the heart rate in bpm.
    #[inline]
    pub fn heart_rate(&self) -> u32 {
        self.heart_rate
    }

    /// Returns the diagnosis.
    #[inline]
    pub fn diagnosis(&self) -> Diagnosis {
        self.diagnosis
    }

    /// Returns the timestamp.
    #[inline]
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Returns the quality flag.
    #[inline]
    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// One-line summary for listings.
    pub fn summary(&self) -> String {
        format!(
            "#{:<5} {}  {:>3} bpm  {:<20} {}",
            self.index + 1,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.heart_rate,
            self.diagnosis.label(),
            self.quality
        )
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("index", &self.index)
            .field("samples", &self.samples.len())
            .field("heart_rate", &self.heart_rate)
            .field("diagnosis", &self.diagnosis)
            .field("timestamp", &self.timestamp)
            .field("quality", &self.quality)
            .finish()
    }
}
