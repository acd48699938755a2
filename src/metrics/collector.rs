//! Metrics collection and registry.

use crate::analysis::CategoryDistribution;
use crate::loader::{LoaderPhase, Progress, ProgressiveLoader};
use crate::random::UniformRandomSource;
use crate::store::RecordStore;
use crate::synthesis::{Diagnosis, RhythmCategory};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use rand_core::RngCore;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of engine state for metrics update.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Records produced so far.
    pub records_generated: u64,
    /// Records to produce in total.
    pub records_target: u64,
    /// Loader phase.
    pub loader_phase: LoaderPhase,
    /// Whether a background loop is running.
    pub background_active: bool,
    /// Current browse cursor.
    pub cursor: u64,
    /// Variates consumed from the random cache.
    pub random_draws: u64,
    /// Random cache refills.
    pub random_refills: u64,
    /// Records per diagnosis.
    pub distribution: CategoryDistribution,
}

/// Prometheus metrics registry for record generation.
pub struct MetricsRegistry {
    registry: Registry,

    // Loader metrics
    records_generated: IntGauge,
    records_target: IntGauge,
    loader_phase: IntGauge,
    background_active: IntGauge,
    cursor: IntGauge,

    // Random cache metrics
    random_draws_total: IntCounter,
    random_refills_total: IntCounter,

    // Dataset metrics
    records_by_diagnosis: IntCounterVec,
}

impl MetricsRegistry {
    /// Creates a new registry with all generation metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let records_generated = IntGauge::new(
            "ecg_synth_records_generated",
            "Number of records generated so far",
        )?;
        let records_target = IntGauge::new(
            "ecg_synth_records_target",
            "Number of records to generate in total",
        )?;
        let loader_phase = IntGauge::new(
            "ecg_synth_loader_phase",
            "Loader phase (0=idle 1=initial 2=partial 3=background 4=complete 5=stopped)",
        )?;
        let background_active = IntGauge::new(
            "ecg_synth_background_active",
            "Whether a background fill loop is running (1=yes, 0=no)",
        )?;
        let cursor = IntGauge::new("ecg_synth_cursor", "Index of the record being viewed")?;

        let random_draws_total = IntCounter::new(
            "ecg_synth_random_draws_total",
            "Total variates consumed from the random cache",
        )?;
        let random_refills_total = IntCounter::new(
            "ecg_synth_random_refills_total",
            "Total random cache refills",
        )?;

        let records_by_diagnosis = IntCounterVec::new(
            Opts::new(
                "ecg_synth_records_by_diagnosis_total",
                "Generated records per diagnosis",
            ),
            &["diagnosis"],
        )?;

        registry.register(Box::new(records_generated.clone()))?;
        registry.register(Box::new(records_target.clone()))?;
        registry.register(Box::new(loader_phase.clone()))?;
        registry.register(Box::new(background_active.clone()))?;
        registry.register(Box::new(cursor.clone()))?;
        registry.register(Box::new(random_draws_total.clone()))?;
        registry.register(Box::new(random_refills_total.clone()))?;
        registry.register(Box::new(records_by_diagnosis.clone()))?;

        // Pre-create every label so all series appear from the first scrape
        for category in RhythmCategory::ALL {
            records_by_diagnosis.with_label_values(&[diagnosis_label(category.into())]);
        }

        Ok(Self {
            registry,
            records_generated,
            records_target,
            loader_phase,
            background_active,
            cursor,
            random_draws_total,
            random_refills_total,
            records_by_diagnosis,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.records_generated.set(snapshot.records_generated as i64);
        self.records_target.set(snapshot.records_target as i64);
        self.loader_phase.set(snapshot.loader_phase.code());
        self.background_active.set(i64::from(snapshot.background_active));
        self.cursor.set(snapshot.cursor as i64);

        // Counters only move forward by the difference
        advance(&self.random_draws_total, snapshot.random_draws);
        advance(&self.random_refills_total, snapshot.random_refills);

        for category in RhythmCategory::ALL {
            let diagnosis = Diagnosis::from(category);
            let counter = self
                .records_by_diagnosis
                .with_label_values(&[diagnosis_label(diagnosis)]);
            advance(&counter, snapshot.distribution.count(diagnosis) as u64);
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

fn diagnosis_label(diagnosis: Diagnosis) -> &'static str {
    match diagnosis {
        Diagnosis::Normal => "normal",
        Diagnosis::Tachycardia => "tachycardia",
        Diagnosis::Bradycardia => "bradycardia",
        Diagnosis::Arrhythmia => "arrhythmia",
    }
}

impl MetricsSnapshot {
    /// Progress pair carried by the snapshot.
    pub fn progress(&self) -> Progress {
        Progress {
            generated: self.records_generated as usize,
            total: self.records_target as usize,
        }
    }

    /// Creates a snapshot from the current state of engine components.
    ///
    /// Constant time: the per-diagnosis counts are kept by the store.
    pub fn from_components<R: RngCore>(
        loader: &ProgressiveLoader,
        store: &RecordStore,
        random: &UniformRandomSource<R>,
    ) -> Self {
        let state = loader.state();

        Self {
            records_generated: state.generated_count as u64,
            records_target: state.target_count as u64,
            loader_phase: loader.phase(),
            background_active: state.is_generating,
            cursor: store.cursor() as u64,
            random_draws: random.draws(),
            random_refills: random.refills(),
            distribution: store.distribution().clone(),
        }
    }
}
