//! Rhythm categories and their base-rate distributions.
//!
//! The band table below is the only place the category weights live.
//! Anything that needs to map a draw to a category goes through
//! [`RhythmCategory::from_draw`].

use crate::random::UniformRandomSource;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

/// Cardiac rhythm category driving rate range and waveform perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmCategory {
    /// Normal sinus rhythm.
    Normal,
    /// Elevated rate.
    Tachycardia,
    /// Depressed rate.
    Bradycardia,
    /// Irregular rhythm with ectopic variability.
    Arrhythmia,
}

/// Cumulative upper bounds (exclusive) of each category's band in `[0, 1)`.
const BANDS: [(f64, RhythmCategory); 4] = [
    (0.75, RhythmCategory::Normal),
    (0.88, RhythmCategory::Tachycardia),
    (0.96, RhythmCategory::Bradycardia),
    (1.00, RhythmCategory::Arrhythmia),
];

impl RhythmCategory {
    /// All categories in band order.
    pub const ALL: [RhythmCategory; 4] = [
        RhythmCategory::Normal,
        RhythmCategory::Tachycardia,
        RhythmCategory::Bradycardia,
        RhythmCategory::Arrhythmia,
    ];

    /// Maps a uniform draw in `[0, 1)` to its category.
    ///
    /// Bands are half-open: a draw exactly on a threshold belongs to the
    /// next band.
    pub fn from_draw(draw: f64) -> Self {
        BANDS
            .iter()
            .find(|(upper, _)| draw < *upper)
            .map(|&(_, category)| category)
            .unwrap_or(RhythmCategory::Arrhythmia)
    }

    /// Expected share of records in this category.
    pub fn weight(self) -> f64 {
        let mut lower = 0.0;
        for (upper, category) in BANDS {
            if category == self {
                return upper - lower;
            }
            lower = upper;
        }
        0.0
    }

    /// Base heart-rate range in beats per minute, `[min, max)`.
    pub fn rate_range(self) -> (f64, f64) {
        match self {
            RhythmCategory::Normal => (60.0, 100.0),
            RhythmCategory::Tachycardia => (100.0, 150.0),
            RhythmCategory::Bradycardia => (40.0, 60.0),
            RhythmCategory::Arrhythmia => (50.0, 120.0),
        }
    }

    /// Whether beat templates for this category carry ectopic noise.
    pub fn is_irregular(self) -> bool {
        matches!(self, RhythmCategory::Arrhythmia)
    }
}

/// Draws a rhythm category and a base rate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RhythmClassifier;

impl RhythmClassifier {
    /// Creates a classifier.
    pub fn new() -> Self {
        Self
    }

    /// Draws a category, then a base rate uniformly within its range.
    pub fn classify<R: RngCore>(
        &self,
        random: &mut UniformRandomSource<R>,
    ) -> (RhythmCategory, f64) {
        let category = RhythmCategory::from_draw(random.next());
        let (min, max) = category.rate_range();
        (category, random.range(min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        let eps = 1e-9;
        assert_eq!(RhythmCategory::from_draw(0.0), RhythmCategory::Normal);
        assert_eq!(RhythmCategory::from_draw(0.75 - eps), RhythmCategory::Normal);
        assert_eq!(RhythmCategory::from_draw(0.75), RhythmCategory::Tachycardia);
        assert_eq!(RhythmCategory::from_draw(0.75 + eps), RhythmCategory::Tachycardia);
        assert_eq!(RhythmCategory::from_draw(0.88 - eps), RhythmCategory::Tachycardia);
        assert_eq!(RhythmCategory::from_draw(0.88), RhythmCategory::Bradycardia);
        assert_eq!(RhythmCategory::from_draw(0.88 + eps), RhythmCategory::Bradycardia);
        assert_eq!(RhythmCategory::from_draw(0.96 - eps), RhythmCategory::Bradycardia);
        assert_eq!(RhythmCategory::from_draw(0.96), RhythmCategory::Arrhythmia);
        assert_eq!(RhythmCategory::from_draw(0.96 + eps), RhythmCategory::Arrhythmia);
        assert_eq!(RhythmCategory::from_draw(1.0 - eps), RhythmCategory::Arrhythmia);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = RhythmCategory::ALL.iter().map(|c| c.weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((RhythmCategory::Tachycardia.weight() - 0.13).abs() < 1e-12);
        assert!((RhythmCategory::Arrhythmia.weight() - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_base_rate_within_category_range() {
        let classifier = RhythmClassifier::new();
        let mut random = UniformRandomSource::seeded(11, 256).unwrap();

        for _ in 0..5_000 {
            let (category, rate) = classifier.classify(&mut random);
            let (min, max) = category.rate_range();
            assert!(rate >= min && rate < max, "{category:?} rate {rate}");
        }
    }

    #[test]
    fn test_only_arrhythmia_is_irregular() {
        let irregular: Vec<_> = RhythmCategory::ALL
            .iter()
            .filter(|c| c.is_irregular())
            .collect();
        assert_eq!(irregular, vec![&RhythmCategory::Arrhythmia]);
    }
}
