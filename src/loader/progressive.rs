//! Burst-then-idle progressive loading.
//!
//! ```text
//! Idle ──start──▶ InitialBurst ──▶ Partial ──▶ BackgroundFill ──▶ Complete
//!                  (frame tasks)       ▲  (idle tasks)
//!                                      └── cursor near the frontier
//! ```
//!
//! The initial burst produces a small number of records a few at a time
//! on frame ticks, so the first record is available almost immediately.
//! The rest is produced in larger batches on idle ticks. At most one
//! background loop is ever queued.

use super::scheduler::{Priority, TaskQueue};
use crate::engine::LoaderConfig;
use crate::store::RecordStore;
use crate::synthesis::RecordSynthesizer;
use rand_core::RngCore;
use serde::Serialize;

/// Loader lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderPhase {
    /// Not started.
    #[default]
    Idle,
    /// Producing the initial records on frame ticks.
    InitialBurst,
    /// Initial records ready; no background loop running.
    Partial,
    /// Background loop producing the remainder on idle ticks.
    BackgroundFill,
    /// Every record has been produced.
    Complete,
    /// Halted by an explicit stop signal.
    Stopped,
}

impl LoaderPhase {
    /// Numeric code used by the metrics gauge.
    pub fn code(self) -> i64 {
        match self {
            LoaderPhase::Idle => 0,
            LoaderPhase::InitialBurst => 1,
            LoaderPhase::Partial => 2,
            LoaderPhase::BackgroundFill => 3,
            LoaderPhase::Complete => 4,
            LoaderPhase::Stopped => 5,
        }
    }
}

/// Generation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoaderState {
    /// Records produced so far. Only ever increases.
    pub generated_count: usize,
    /// Records to produce in total.
    pub target_count: usize,
    /// True while a background loop owns scheduling.
    pub is_generating: bool,
}

/// Read-only progress pair for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Records produced so far.
    pub generated: usize,
    /// Records to produce in total.
    pub total: usize,
}

impl Progress {
    /// Completed fraction in `[0, 1]`. An empty target counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.generated as f64 / self.total as f64
        }
    }

    /// Completed percentage in `[0, 100]`.
    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    /// Returns true once everything has been produced.
    pub fn is_complete(&self) -> bool {
        self.generated >= self.total
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({:.1}%)", self.generated, self.total, self.percent())
    }
}

/// Outcome of one scheduling tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Priority the task was queued with.
    pub priority: Priority,
    /// Records produced by this tick.
    pub produced: usize,
    /// Progress after the tick.
    pub progress: Progress,
    /// Phase after the tick.
    pub phase: LoaderPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadTask {
    InitialBatch,
    BackgroundBatch,
}

/// Scheduling policy feeding a [`RecordStore`].
#[derive(Debug)]
pub struct ProgressiveLoader {
    config: LoaderConfig,
    phase: LoaderPhase,
    state: LoaderState,
    /// Initial burst size, capped at the total.
    initial_target: usize,
    queue: TaskQueue<LoadTask>,
    stop_requested: bool,
}

impl ProgressiveLoader {
    /// Creates an idle loader.
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            config: config.clone(),
            phase: LoaderPhase::Idle,
            state: LoaderState {
                generated_count: 0,
                target_count: config.total_records,
                is_generating: false,
            },
            initial_target: config.initial_load_count.min(config.total_records),
            queue: TaskQueue::new(),
            stop_requested: false,
        }
    }

    /// Returns the current phase.
    pub fn phase(&self) -> LoaderPhase {
        self.phase
    }

    /// Returns the generation counters.
    pub fn state(&self) -> LoaderState {
        self.state
    }

    /// Returns the progress pair.
    pub fn progress(&self) -> Progress {
        Progress {
            generated: self.state.generated_count,
            total: self.state.target_count,
        }
    }

    /// Returns the priority of the next pending tick, if any.
    pub fn next_priority(&self) -> Option<Priority> {
        self.queue.peek_priority()
    }

    /// Returns true when no tick is pending.
    pub fn is_settled(&self) -> bool {
        self.queue.is_empty()
    }

    /// Begins the initial burst. Has no effect after the first call.
    pub fn start(&mut self) {
        if self.phase != LoaderPhase::Idle {
            tracing::debug!(phase = ?self.phase, "Loader already started");
            return;
        }

        if self.state.target_count == 0 {
            self.phase = LoaderPhase::Complete;
            tracing::info!("Nothing to generate");
            return;
        }

        tracing::info!(
            initial = self.initial_target,
            total = self.state.target_count,
            "Starting initial burst"
        );

        if self.initial_target == 0 {
            self.finish_initial_burst();
        } else {
            self.phase = LoaderPhase::InitialBurst;
            self.queue.schedule(Priority::Frame, LoadTask::InitialBatch);
        }
    }

    /// Enters the background loop unless one is already running.
    ///
    /// Returns true if a new loop was started.
    pub fn start_background(&mut self) -> bool {
        if self.stop_requested || self.state.is_generating {
            return false;
        }
        if self.phase != LoaderPhase::Partial {
            return false;
        }
        if self.state.generated_count >= self.state.target_count {
            self.phase = LoaderPhase::Complete;
            return false;
        }

        self.state.is_generating = true;
        self.phase = LoaderPhase::BackgroundFill;
        self.queue.schedule(Priority::Idle, LoadTask::BackgroundBatch);

        tracing::debug!(
            generated = self.state.generated_count,
            total = self.state.target_count,
            "Background fill started"
        );
        true
    }

    /// Re-entry trigger for navigation.
    ///
    /// When the viewer is within the lookahead window of the last
    /// generated record and no background loop is running, starts one.
    pub fn on_cursor_moved(&mut self, cursor: usize, len: usize) -> bool {
        if cursor.saturating_add(self.config.lookahead) < len {
            return false;
        }
        self.start_background()
    }

    /// Requests a stop. Takes effect before the next batch; repeated
    /// calls are no-ops.
    pub fn stop(&mut self) {
        if matches!(self.phase, LoaderPhase::Complete | LoaderPhase::Stopped) {
            return;
        }
        self.stop_requested = true;
        if self.queue.is_empty() {
            self.halt();
        }
    }

    /// Runs the next pending task, if any.
    pub fn tick<R: RngCore>(
        &mut self,
        synthesizer: &mut RecordSynthesizer<R>,
        store: &mut RecordStore,
    ) -> Option<TickReport> {
        let (priority, task) = self.queue.pop()?;

        if self.stop_requested {
            self.halt();
            return Some(self.report(priority, 0));
        }

        let produced = match task {
            LoadTask::InitialBatch => {
                let end = (self.state.generated_count + self.config.initial_batch_size)
                    .min(self.initial_target);
                let produced = self.produce(end, synthesizer, store);

                if self.state.generated_count < self.initial_target {
                    self.queue.schedule(Priority::Frame, LoadTask::InitialBatch);
                } else {
                    self.finish_initial_burst();
                }
                produced
            }
            LoadTask::BackgroundBatch => {
                let end = (self.state.generated_count + self.config.background_batch_size)
                    .min(self.state.target_count);
                let produced = self.produce(end, synthesizer, store);

                if self.state.generated_count >= self.state.target_count {
                    self.state.is_generating = false;
                    self.phase = LoaderPhase::Complete;
                    tracing::info!(total = self.state.target_count, "All records generated");
                } else {
                    self.queue.schedule(Priority::Idle, LoadTask::BackgroundBatch);
                }
                produced
            }
        };

        tracing::debug!(
            ?priority,
            produced,
            generated = self.state.generated_count,
            total = self.state.target_count,
            "Batch complete"
        );

        Some(self.report(priority, produced))
    }

    fn produce<R: RngCore>(
        &mut self,
        end: usize,
        synthesizer: &mut RecordSynthesizer<R>,
        store: &mut RecordStore,
    ) -> usize {
        let start = self.state.generated_count;
        for index in start..end {
            store.append(synthesizer.synthesize(index as u64));
        }
        self.state.generated_count = end.max(start);
        self.state.generated_count - start
    }

    fn finish_initial_burst(&mut self) {
        tracing::info!(
            generated = self.state.generated_count,
            "Initial burst complete"
        );
        if self.state.generated_count >= self.state.target_count {
            self.phase = LoaderPhase::Complete;
            tracing::info!(total = self.state.target_count, "All records generated");
            return;
        }

        self.phase = LoaderPhase::Partial;
        if self.config.auto_background {
            self.start_background();
        }
    }

    fn halt(&mut self) {
        self.queue.clear();
        self.state.is_generating = false;
        self.phase = LoaderPhase::Stopped;
        tracing::info!(
            generated = self.state.generated_count,
            total = self.state.target_count,
            "Loader stopped"
        );
    }

    fn report(&self, priority: Priority, produced: usize) -> TickReport {
        TickReport {
            priority,
            produced,
            progress: self.progress(),
            phase: self.phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SynthesisConfig;
    use crate::random::UniformRandomSource;
    use crate::synthesis::TimestampAssigner;
    use chrono::NaiveDate;
    use rand_chacha::ChaCha20Rng;

    struct Harness {
        loader: ProgressiveLoader,
        synth: RecordSynthesizer<ChaCha20Rng>,
        store: RecordStore,
    }

    impl Harness {
        fn new(config: LoaderConfig) -> Self {
            let synthesis = SynthesisConfig {
                sample_rate_hz: 50,
                record_duration_secs: 1,
            };
            let anchor = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
            Self {
                loader: ProgressiveLoader::new(&config),
                synth: RecordSynthesizer::new(
                    &synthesis,
                    TimestampAssigner::new(anchor, 10),
                    UniformRandomSource::seeded(42, 1024).unwrap(),
                ),
                store: RecordStore::new(),
            }
        }

        fn tick(&mut self) -> Option<TickReport> {
            self.loader.tick(&mut self.synth, &mut self.store)
        }

        fn drain(&mut self) -> usize {
            let mut ticks = 0;
            while self.tick().is_some() {
                ticks += 1;
                assert!(ticks < 10_000, "loader did not settle");
            }
            ticks
        }
    }

    fn config(total: usize, initial: usize, batch: usize) -> LoaderConfig {
        LoaderConfig {
            total_records: total,
            initial_load_count: initial,
            initial_batch_size: 2,
            background_batch_size: batch,
            lookahead: 5,
            auto_background: true,
        }
    }

    #[test]
    fn test_scenario_ten_four_three() {
        let mut h = Harness::new(config(10, 4, 3));
        h.loader.start();
        assert_eq!(h.loader.phase(), LoaderPhase::InitialBurst);

        // Two frame ticks of two records each
        let first = h.tick().unwrap();
        assert_eq!(first.priority, Priority::Frame);
        assert_eq!(first.produced, 2);
        let second = h.tick().unwrap();
        assert_eq!(second.priority, Priority::Frame);
        assert_eq!(h.store.len(), 4);
        assert_eq!(h.loader.phase(), LoaderPhase::BackgroundFill);
        assert!(h.loader.state().is_generating);

        let third = h.tick().unwrap();
        assert_eq!(third.priority, Priority::Idle);
        assert_eq!(h.store.len(), 7);

        let fourth = h.tick().unwrap();
        assert_eq!(h.store.len(), 10);
        assert_eq!(fourth.phase, LoaderPhase::Complete);
        assert_eq!(fourth.progress, Progress { generated: 10, total: 10 });
        assert!(!h.loader.state().is_generating);
        assert!(h.tick().is_none());
    }

    #[test]
    fn test_records_in_index_order() {
        let mut h = Harness::new(config(23, 5, 4));
        h.loader.start();
        h.drain();

        let indices: Vec<u64> = h.store.iter().map(|r| r.index()).collect();
        let expected: Vec<u64> = (0..23).collect();
        assert_eq!(indices, expected);
    }

    #[test]
    fn test_completes_for_various_totals() {
        for total in [0, 1, 2, 3, 9, 10, 11, 57] {
            let mut h = Harness::new(config(total, 10, 10));
            h.loader.start();
            let ticks = h.drain();
            assert_eq!(h.loader.phase(), LoaderPhase::Complete, "total {total}");
            assert_eq!(h.store.len(), total);
            assert!(ticks <= total.div_ceil(2) + total.div_ceil(10) + 1);
        }
    }

    #[test]
    fn test_generated_never_exceeds_total() {
        let mut h = Harness::new(config(7, 20, 100));
        h.loader.start();
        while let Some(report) = h.tick() {
            assert!(report.progress.generated <= 7);
        }
        assert_eq!(h.store.len(), 7);
    }

    #[test]
    fn test_single_flight() {
        let mut h = Harness::new(config(40, 4, 5));
        h.loader.start();
        h.tick();
        h.tick();
        assert_eq!(h.loader.phase(), LoaderPhase::BackgroundFill);

        // Already running: every further request is a no-op
        assert!(!h.loader.start_background());
        assert!(!h.loader.start_background());
        assert!(!h.loader.on_cursor_moved(3, 4));

        let before = h.store.len();
        h.tick();
        assert_eq!(h.store.len(), before + 5);
        h.tick();
        assert_eq!(h.store.len(), before + 10);
    }

    #[test]
    fn test_manual_background_via_cursor() {
        let mut cfg = config(30, 6, 10);
        cfg.auto_background = false;
        let mut h = Harness::new(cfg);
        h.loader.start();
        h.drain();

        assert_eq!(h.loader.phase(), LoaderPhase::Partial);
        assert_eq!(h.store.len(), 6);

        // Far from the frontier: nothing happens
        assert!(!h.loader.on_cursor_moved(0, 6));
        assert!(h.loader.is_settled());

        // Within the lookahead window: background fill re-enters
        assert!(h.loader.on_cursor_moved(1, 6));
        assert_eq!(h.loader.phase(), LoaderPhase::BackgroundFill);
        assert_eq!(h.loader.next_priority(), Some(Priority::Idle));

        h.drain();
        assert_eq!(h.loader.phase(), LoaderPhase::Complete);
        assert_eq!(h.store.len(), 30);
        assert!(!h.loader.on_cursor_moved(29, 30));
    }

    #[test]
    fn test_burst_covering_total_completes_without_background() {
        let mut cfg = config(10, 10, 3);
        cfg.auto_background = false;
        let mut h = Harness::new(cfg);
        h.loader.start();
        let ticks = h.drain();

        assert_eq!(ticks, 5);
        assert_eq!(h.store.len(), 10);
        assert_eq!(h.loader.phase(), LoaderPhase::Complete);
        assert!(h.loader.is_settled());
        assert!(!h.loader.state().is_generating);
        assert!(!h.loader.on_cursor_moved(9, 10));
        assert_eq!(h.loader.phase(), LoaderPhase::Complete);
    }

    #[test]
    fn test_stop_before_next_batch() {
        let mut h = Harness::new(config(50, 4, 5));
        h.loader.start();
        h.tick();
        h.tick();
        h.tick();
        assert_eq!(h.store.len(), 9);

        h.loader.stop();
        h.loader.stop();
        let report = h.tick().unwrap();
        assert_eq!(report.produced, 0);
        assert_eq!(report.phase, LoaderPhase::Stopped);
        assert!(h.tick().is_none());
        assert_eq!(h.store.len(), 9);
        assert!(!h.loader.state().is_generating);

        // Stopped is sticky
        assert!(!h.loader.on_cursor_moved(8, 9));
        h.loader.stop();
        assert_eq!(h.loader.phase(), LoaderPhase::Stopped);
    }

    #[test]
    fn test_stop_when_settled_is_immediate() {
        let mut cfg = config(20, 2, 5);
        cfg.auto_background = false;
        let mut h = Harness::new(cfg);
        h.loader.start();
        h.drain();
        assert_eq!(h.loader.phase(), LoaderPhase::Partial);

        h.loader.stop();
        assert_eq!(h.loader.phase(), LoaderPhase::Stopped);
    }

    #[test]
    fn test_zero_initial_goes_straight_to_background() {
        let mut h = Harness::new(config(5, 0, 2));
        h.loader.start();
        assert_eq!(h.loader.phase(), LoaderPhase::BackgroundFill);
        assert_eq!(h.loader.next_priority(), Some(Priority::Idle));
        h.drain();
        assert_eq!(h.store.len(), 5);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut h = Harness::new(config(10, 4, 3));
        h.loader.start();
        h.loader.start();
        h.drain();
        assert_eq!(h.store.len(), 10);
    }

    #[test]
    fn test_progress_display() {
        let progress = Progress { generated: 3, total: 8 };
        assert_eq!(progress.to_string(), "3/8 (37.5%)");
        assert!(Progress { generated: 0, total: 0 }.is_complete());
    }
}
