//! Progressive loading.
//!
//! Splits generation of the dataset into small cooperative tasks so the
//! consumer can start browsing after the first few records exist.

mod progressive;
mod scheduler;

pub use progressive::{LoaderPhase, LoaderState, Progress, ProgressiveLoader, TickReport};
pub use scheduler::{Immediate, Pacer, Priority, TaskQueue, ThreadPacer};
