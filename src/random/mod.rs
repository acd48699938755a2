//! Cached uniform randomness.
//!
//! All stochastic parts of synthesis draw through a single
//! [`UniformRandomSource`] owned by the engine instance.

mod cache;

pub use cache::{RandomError, UniformRandomSource, DEFAULT_CACHE_SIZE};
