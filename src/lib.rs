//! Synthetic ECG Record Library
//!
//! Generates a browsable dataset of plausible-looking ECG traces with
//! rhythm labels, heart rates, quality flags and business-hours
//! timestamps. Records are produced progressively so the first few can be
//! browsed while the rest are still being synthesized.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! random → synthesis → store → (renderer / UI)
//!              ↑          ↓
//!              └─ loader ←┘  cursor near frontier
//!
//!          analysis, metrics (observers)
//! ```
//!
//! # Design Principles
//!
//! - **Single owner**: one [`Engine`] owns the random cache, the store and
//!   the loader; nothing is global
//! - **Cryptographic draws**: variates come from the OS entropy source,
//!   batched through a cache
//! - **Policy apart from mechanism**: the loader only queues tasks; a
//!   [`loader::Pacer`] decides how the host waits
//! - **Not clinical**: waveforms are visually plausible, nothing more
//!
//! # Example
//!
//! ```no_run
//! use ecg_synth::{loader::Immediate, Engine, EngineConfig};
//! use std::sync::atomic::AtomicBool;
//!
//! let mut engine = Engine::new(EngineConfig::default()).unwrap();
//! engine.start();
//!
//! let stop = AtomicBool::new(false);
//! engine.run_until_settled(&mut Immediate, &stop, |_, report| {
//!     println!("{}", report.progress);
//! });
//!
//! let record = engine.next_record().unwrap();
//! println!("{}", record.summary());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod engine;
pub mod loader;
pub mod metrics;
pub mod random;
pub mod render;
pub mod store;
pub mod synthesis;

// Re-export commonly used types at crate root
pub use analysis::{CategoryDistribution, SampleStatistics};
pub use engine::{ConfigError, Engine, EngineConfig, EngineError};
pub use loader::{LoaderPhase, Progress, ProgressiveLoader, TickReport};
pub use random::{RandomError, UniformRandomSource};
pub use store::{RecordStore, StoreError};
pub use synthesis::{Diagnosis, Quality, Record, RecordSynthesizer, RhythmCategory, Severity};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
