//! Prometheus metrics for record generation.
//!
//! The registry is always available. The HTTP exporter is compiled only
//! with the `metrics` feature; it also serves generation progress as JSON
//! on `/progress` and the latest snapshot on `/status`.
//!
//! # Metrics Exposed
//!
//! ## Loader Metrics
//! - `ecg_synth_records_generated` - Records generated so far
//! - `ecg_synth_records_target` - Records to generate in total
//! - `ecg_synth_loader_phase` - Loader phase code
//! - `ecg_synth_background_active` - Background fill running (1/0)
//! - `ecg_synth_cursor` - Index of the record being viewed
//!
//! ## Random Cache Metrics
//! - `ecg_synth_random_draws_total` - Variates consumed
//! - `ecg_synth_random_refills_total` - Cache refills
//!
//! ## Dataset Metrics
//! - `ecg_synth_records_by_diagnosis_total{diagnosis}` - Records per diagnosis
//!
//! # Example
//!
//! ```no_run
//! use ecg_synth::loader::LoaderPhase;
//! use ecg_synth::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     records_generated: 10,
//!     records_target: 100,
//!     loader_phase: LoaderPhase::BackgroundFill,
//!     background_active: true,
//!     ..Default::default()
//! };
//!
//! registry.update(&snapshot);
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{
    MetricsServer, MetricsServerConfig, MetricsState, ProgressBody, ServerError, SharedState,
};
