//! Single-beat waveform template.
//!
//! A beat is modeled as five half-sine lobes (P, Q, R, S, T) placed at
//! fixed fractions of the cardiac cycle. Everything outside the lobes is
//! isoelectric baseline.

use super::rhythm::RhythmCategory;
use crate::random::UniformRandomSource;
use rand_core::RngCore;
use std::f64::consts::PI;

/// Probability that an irregular beat sample receives an ectopic kick.
const ECTOPIC_PROBABILITY: f64 = 0.05;

/// Full width of the ectopic perturbation, centered on zero.
const ECTOPIC_SPAN: f64 = 0.3;

/// One named segment of the beat morphology.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wave {
    /// Wave name (P, Q, R, S or T).
    pub name: char,
    /// Phase where the lobe starts (inclusive).
    pub start: f64,
    /// Phase where the lobe ends (inclusive).
    pub end: f64,
    /// Peak amplitude of the lobe.
    pub amplitude: f64,
}

impl Wave {
    #[inline]
    fn contains(&self, phase: f64) -> bool {
        phase >= self.start && phase <= self.end
    }

    #[inline]
    fn value_at(&self, phase: f64) -> f64 {
        let local = (phase - self.start) / (self.end - self.start);
        self.amplitude * (PI * local).sin()
    }
}

/// PQRST morphology, in evaluation order. Where two closed intervals
/// touch, the earlier wave wins.
pub const WAVES: [Wave; 5] = [
    Wave {
        name: 'P',
        start: 0.05,
        end: 0.15,
        amplitude: 0.15,
    },
    Wave {
        name: 'Q',
        start: 0.17,
        end: 0.19,
        amplitude: -0.2,
    },
    Wave {
        name: 'R',
        start: 0.19,
        end: 0.23,
        amplitude: 1.5,
    },
    Wave {
        name: 'S',
        start: 0.23,
        end: 0.26,
        amplitude: -0.4,
    },
    Wave {
        name: 'T',
        start: 0.28,
        end: 0.42,
        amplitude: 0.25,
    },
];

/// Evaluates the noiseless beat model at a phase in `[0, 1)`.
pub fn baseline_at(phase: f64) -> f64 {
    WAVES
        .iter()
        .find(|wave| wave.contains(phase))
        .map_or(0.0, |wave| wave.value_at(phase))
}

/// Builds one-beat templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct BeatTemplateBuilder;

impl BeatTemplateBuilder {
    /// Creates a builder.
    pub fn new() -> Self {
        Self
    }

    /// Builds a template of `samples_per_beat` samples for the category.
    ///
    /// Irregular categories draw from `random` once per sample, plus once
    /// more for each sample that gets perturbed.
    pub fn build<R: RngCore>(
        &self,
        samples_per_beat: usize,
        category: RhythmCategory,
        random: &mut UniformRandomSource<R>,
    ) -> Vec<f32> {
        let irregular = category.is_irregular();
        let n = samples_per_beat as f64;

        (0..samples_per_beat)
            .map(|i| {
                let mut value = baseline_at(i as f64 / n);
                if irregular && random.chance(ECTOPIC_PROBABILITY) {
                    value += (random.next() - 0.5) * ECTOPIC_SPAN;
                }
                value as f32
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random() -> UniformRandomSource<rand_chacha::ChaCha20Rng> {
        UniformRandomSource::seeded(5, 1024).unwrap()
    }

    #[test]
    fn test_template_length() {
        let builder = BeatTemplateBuilder::new();
        let mut random = random();
        for n in [1, 7, 150, 375] {
            assert_eq!(builder.build(n, RhythmCategory::Normal, &mut random).len(), n);
        }
    }

    #[test]
    fn test_baseline_outside_waves() {
        for phase in [0.0, 0.02, 0.16, 0.27, 0.5, 0.9, 0.999] {
            assert_eq!(baseline_at(phase), 0.0, "phase {phase}");
        }
    }

    #[test]
    fn test_wave_peaks() {
        assert!((baseline_at(0.10) - 0.15).abs() < 1e-9);
        assert!((baseline_at(0.18) + 0.2).abs() < 1e-9);
        assert!((baseline_at(0.21) - 1.5).abs() < 1e-9);
        assert!((baseline_at(0.245) + 0.4).abs() < 1e-9);
        assert!((baseline_at(0.35) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_regular_template_draws_nothing() {
        let builder = BeatTemplateBuilder::new();
        let mut random = random();
        let a = builder.build(250, RhythmCategory::Tachycardia, &mut random);
        let b = builder.build(250, RhythmCategory::Tachycardia, &mut random);
        assert_eq!(random.draws(), 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_r_wave_dominates() {
        let builder = BeatTemplateBuilder::new();
        let mut random = random();
        let template = builder.build(500, RhythmCategory::Normal, &mut random);

        let (peak_index, peak) = template
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });

        assert!((peak - 1.5).abs() < 0.01);
        let phase = peak_index as f64 / 500.0;
        assert!((0.19..=0.23).contains(&phase));
    }

    #[test]
    fn test_arrhythmia_perturbs_some_samples() {
        let builder = BeatTemplateBuilder::new();
        let mut random = random();
        let template = builder.build(2000, RhythmCategory::Arrhythmia, &mut random);

        let perturbed = template
            .iter()
            .enumerate()
            .filter(|&(i, &v)| (v as f64 - baseline_at(i as f64 / 2000.0)).abs() > 1e-6)
            .count();

        // ~5% of 2000, with generous slack
        assert!(perturbed > 40 && perturbed < 180, "perturbed {perturbed}");
        assert!(template.iter().all(|v| v.is_finite() && v.abs() < 2.0));
    }
}
