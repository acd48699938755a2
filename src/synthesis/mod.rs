//! Parametric waveform synthesis.
//!
//! This module turns a sequence index into a complete [`Record`]:
//! a rhythm draw picks the category and rate, a beat template is built
//! for that rate, tiled across the record, and stamped with a
//! business-hours timestamp.

mod record;
mod rhythm;
mod synthesizer;
mod template;
mod timestamp;

pub use record::{Diagnosis, Quality, Record, Severity};
pub use rhythm::{RhythmCategory, RhythmClassifier};
pub use synthesizer::{beat_period_samples, RecordSynthesizer, HEART_RATE_BOUNDS};
pub use template::{baseline_at, BeatTemplateBuilder, Wave, WAVES};
pub use timestamp::{default_anchor, is_weekend, TimestampAssigner, DEFAULT_RECORDS_PER_DAY};
