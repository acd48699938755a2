//! Explicitly constructed engine instance.
//!
//! The engine owns every piece of mutable state: the random cache (inside
//! the synthesizer), the record store and the loader. Independent engines
//! never share anything.

mod config;

pub use config::{
    ConfigError, EngineConfig, LoaderConfig, PacingConfig, RandomConfig, SynthesisConfig,
    TimestampConfig,
};

use crate::loader::{Pacer, Priority, Progress, ProgressiveLoader, TickReport};
use crate::random::{RandomError, UniformRandomSource};
use crate::store::{RecordStore, StoreError};
use crate::synthesis::{default_anchor, Record, RecordSynthesizer, TimestampAssigner};
use rand_chacha::ChaCha20Rng;
use rand_core::{OsRng, RngCore};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Errors that can occur while building or driving an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("random source: {0}")]
    Random(#[from] RandomError),
}

/// Synthetic record engine.
pub struct Engine<R: RngCore = OsRng> {
    config: EngineConfig,
    synthesizer: RecordSynthesizer<R>,
    store: RecordStore,
    loader: ProgressiveLoader,
}

impl Engine<OsRng> {
    /// Creates an engine drawing from the OS entropy source.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let random = UniformRandomSource::from_os_entropy(config.random.cache_size)?;
        Self::with_random(config, random)
    }
}

impl Engine<ChaCha20Rng> {
    /// Creates a reproducible engine from a numeric seed.
    pub fn seeded(config: EngineConfig, seed: u64) -> Result<Self, EngineError> {
        config.validate()?;
        let random = UniformRandomSource::seeded(seed, config.random.cache_size)?;
        Self::with_random(config, random)
    }

    /// Creates a reproducible engine from a text label.
    pub fn from_seed_label(config: EngineConfig, label: &str) -> Result<Self, EngineError> {
        config.validate()?;
        let random = UniformRandomSource::from_label(label, config.random.cache_size)?;
        Self::with_random(config, random)
    }
}

impl<R: RngCore> Engine<R> {
    /// Creates an engine over an existing random source.
    pub fn with_random(
        config: EngineConfig,
        random: UniformRandomSource<R>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let anchor = config
            .timestamps
            .anchor
            .unwrap_or_else(|| default_anchor(chrono::Local::now().date_naive()));
        let timestamps = TimestampAssigner::new(anchor, config.timestamps.records_per_day);
        let synthesizer = RecordSynthesizer::new(&config.synthesis, timestamps, random);

        tracing::info!(
            %anchor,
            sample_rate = config.synthesis.sample_rate_hz,
            duration_secs = config.synthesis.record_duration_secs,
            total = config.loader.total_records,
            "Engine created"
        );

        Ok(Self {
            store: RecordStore::with_capacity(config.loader.total_records),
            loader: ProgressiveLoader::new(&config.loader),
            synthesizer,
            config,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the record store.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Returns the loader.
    pub fn loader(&self) -> &ProgressiveLoader {
        &self.loader
    }

    /// Returns the synthesizer.
    pub fn synthesizer(&self) -> &RecordSynthesizer<R> {
        &self.synthesizer
    }

    /// Returns the progress pair.
    pub fn progress(&self) -> Progress {
        self.loader.progress()
    }

    /// Begins loading.
    pub fn start(&mut self) {
        self.loader.start();
    }

    /// Requests the loader to stop before its next batch.
    pub fn stop(&mut self) {
        self.loader.stop();
    }

    /// Priority of the next pending tick, if any.
    pub fn next_priority(&self) -> Option<Priority> {
        self.loader.next_priority()
    }

    /// Runs one batch.
    pub fn tick(&mut self) -> Option<TickReport> {
        self.loader.tick(&mut self.synthesizer, &mut self.store)
    }

    /// Drives the loader until no work is pending.
    ///
    /// `stop` is polled before each batch; once set, the loader is
    /// stopped. `observe` sees the engine after every tick. Returns the
    /// number of ticks run.
    pub fn run_until_settled<P: Pacer + ?Sized>(
        &mut self,
        pacer: &mut P,
        stop: &AtomicBool,
        mut observe: impl FnMut(&Self, &TickReport),
    ) -> usize {
        let mut ticks = 0;
        while let Some(priority) = self.next_priority() {
            if stop.load(Ordering::Relaxed) {
                self.stop();
            }
            pacer.wait(priority);
            if let Some(report) = self.tick() {
                observe(self, &report);
                ticks += 1;
            }
        }
        ticks
    }

    /// Returns the record under the cursor.
    pub fn current(&self) -> Result<&Record, StoreError> {
        self.store.current()
    }

    /// Steps to the next record (clamped) and returns it.
    pub fn next_record(&mut self) -> Result<&Record, StoreError> {
        self.navigate(1)
    }

    /// Steps to the previous record (clamped) and returns it.
    pub fn previous_record(&mut self) -> Result<&Record, StoreError> {
        self.navigate(-1)
    }

    /// Jumps to a record by index and returns it.
    pub fn select(&mut self, index: usize) -> Result<&Record, StoreError> {
        let cursor = self.store.select(index)?;
        self.loader.on_cursor_moved(cursor, self.store.len());
        self.store.current()
    }

    fn navigate(&mut self, delta: isize) -> Result<&Record, StoreError> {
        let cursor = self.store.move_cursor(delta)?;
        if self.loader.on_cursor_moved(cursor, self.store.len()) {
            tracing::debug!(cursor, len = self.store.len(), "Navigation near frontier");
        }
        self.store.current()
    }
}

impl<R: RngCore> std::fmt::Debug for Engine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("phase", &self.loader.phase())
            .field("progress", &self.loader.progress())
            .field("cursor", &self.store.cursor())
            .finish_non_exhaustive()
    }
}
