//! Per-record sample statistics.
//!
//! Sanity checks on a synthesized waveform, not a clinical validation.

use crate::synthesis::Record;
use serde::Serialize;

/// Largest absolute sample a synthesized trace can reach, with margin.
const PLAUSIBLE_PEAK: f64 = 2.5;

/// Summary statistics of one record's samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleStatistics {
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population variance.
    pub variance: f64,
    /// True if every sample is finite.
    pub all_finite: bool,
    /// Number of samples analyzed.
    pub sample_count: usize,
}

impl SampleStatistics {
    /// Computes statistics for a record.
    pub fn analyze(record: &Record) -> Self {
        Self::from_samples(record.samples())
    }

    /// Computes statistics for a raw sample slice.
    pub fn from_samples(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                variance: 0.0,
                all_finite: true,
                sample_count: 0,
            };
        }

        let n = samples.len() as f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut all_finite = true;

        for &s in samples {
            let s = s as f64;
            all_finite &= s.is_finite();
            min = min.min(s);
            max = max.max(s);
            sum += s;
        }

        let mean = sum / n;
        let variance = samples
            .iter()
            .map(|&s| (s as f64 - mean).powi(2))
            .sum::<f64>()
            / n;

        Self {
            min,
            max,
            mean,
            variance,
            all_finite,
            sample_count: samples.len(),
        }
    }

    /// Peak-to-peak amplitude.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Returns true if the trace looks like a plausible synthetic ECG.
    pub fn looks_plausible(&self) -> bool {
        let range_ok = self.min >= -PLAUSIBLE_PEAK && self.max <= PLAUSIBLE_PEAK;
        // A flat line has no beats in it
        let moving = self.variance > 1e-4;

        self.all_finite && range_ok && moving
    }
}
