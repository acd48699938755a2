//! Full-record synthesis.
//!
//! A record is one beat template tiled across the record length, scaled
//! by a per-record amplitude factor and overlaid with small uniform noise.

use super::{
    record::{Diagnosis, Quality, Record},
    rhythm::RhythmClassifier,
    template::BeatTemplateBuilder,
    timestamp::TimestampAssigner,
};
use crate::engine::SynthesisConfig;
use crate::random::UniformRandomSource;
use rand_core::{OsRng, RngCore};

/// Half-width of the per-record heart-rate jitter in bpm.
const RATE_JITTER_BPM: f64 = 5.0;

/// Per-record amplitude scale range.
const AMPLITUDE_RANGE: (f64, f64) = (0.7, 1.3);

/// Full width of the per-sample additive noise.
const NOISE_SPAN: f64 = 0.03;

/// Draws above this flag a record as good quality.
const GOOD_QUALITY_THRESHOLD: f64 = 0.15;

/// Effective heart rates are confined to the union of category ranges.
pub const HEART_RATE_BOUNDS: (f64, f64) = (40.0, 150.0);

/// Produces complete records from a sequence index.
///
/// Owns the random source; every draw made during synthesis goes
/// through it.
pub struct RecordSynthesizer<R: RngCore = OsRng> {
    random: UniformRandomSource<R>,
    classifier: RhythmClassifier,
    templates: BeatTemplateBuilder,
    timestamps: TimestampAssigner,
    sample_rate: u32,
    samples_per_record: usize,
}

impl<R: RngCore> RecordSynthesizer<R> {
    /// Creates a synthesizer.
    pub fn new(
        config: &SynthesisConfig,
        timestamps: TimestampAssigner,
        random: UniformRandomSource<R>,
    ) -> Self {
        Self {
            random,
            classifier: RhythmClassifier::new(),
            templates: BeatTemplateBuilder::new(),
            timestamps,
            sample_rate: config.sample_rate_hz,
            samples_per_record: config.samples_per_record(),
        }
    }

    /// Returns the fixed sample count of every record.
    pub fn samples_per_record(&self) -> usize {
        self.samples_per_record
    }

    /// Returns the random source.
    pub fn random(&self) -> &UniformRandomSource<R> {
        &self.random
    }

    /// Returns the timestamp assigner.
    pub fn timestamps(&self) -> &TimestampAssigner {
        &self.timestamps
    }

    /// Synthesizes the record at `sequence_index`.
    pub fn synthesize(&mut self, sequence_index: u64) -> Record {
        let (category, base_rate) = self.classifier.classify(&mut self.random);
        let jitter = self.random.range(-RATE_JITTER_BPM, RATE_JITTER_BPM);
        let amplitude = self.random.range(AMPLITUDE_RANGE.0, AMPLITUDE_RANGE.1);

        let rate = (base_rate + jitter).clamp(HEART_RATE_BOUNDS.0, HEART_RATE_BOUNDS.1);
        let samples_per_beat = beat_period_samples(rate, self.sample_rate);

        let template = self
            .templates
            .build(samples_per_beat, category, &mut self.random);
        let samples = self.tile(&template, amplitude);

        let timestamp = self.timestamps.assign(sequence_index, &mut self.random);
        let quality = if self.random.next() > GOOD_QUALITY_THRESHOLD {
            Quality::Good
        } else {
            Quality::Fair
        };

        tracing::trace!(
            index = sequence_index,
            ?category,
            rate,
            samples_per_beat,
            "Synthesized record"
        );

        Record::new(
            sequence_index,
            samples,
            rate.round() as u32,
            Diagnosis::from(category),
            timestamp,
            quality,
        )
    }

    /// Repeats `template` from offset 0 until the record is full,
    /// truncating the last copy.
    fn tile(&mut self, template: &[f32], amplitude: f64) -> Vec<f32> {
        let mut samples = Vec::with_capacity(self.samples_per_record);
        while samples.len() < self.samples_per_record {
            let take = template.len().min(self.samples_per_record - samples.len());
            for &value in &template[..take] {
                let noise = (self.random.next() - 0.5) * NOISE_SPAN;
                samples.push((value as f64 * amplitude + noise) as f32);
            }
        }
        samples
    }
}

/// Samples in one beat at `rate` bpm, never less than one.
pub fn beat_period_samples(rate: f64, sample_rate: u32) -> usize {
    ((60.0 / rate) * sample_rate as f64).floor().max(1.0) as usize
}

impl<R: RngCore> std::fmt::Debug for RecordSynthesizer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSynthesizer")
            .field("sample_rate", &self.sample_rate)
            .field("samples_per_record", &self.samples_per_record)
            .field("random", &self.random)
            .finish_non_exhaustive()
    }
}
