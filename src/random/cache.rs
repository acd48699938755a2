//! Batch-refilling cache of uniform variates.
//!
//! Drawing from the OS entropy source one value at a time is expensive,
//! so the cache pulls a large block of 32-bit words in a single call and
//! serves `[0, 1)` variates from it until the block is exhausted.
//!
//! # Source Model
//!
//! - Production: `OsRng`, the operating system's CSPRNG. Construction
//!   fails with [`RandomError::EntropyUnavailable`] if it cannot be read.
//! - Reproducible runs: ChaCha20 seeded from a `u64` or from a label
//!   hashed with BLAKE3. Still a cryptographic generator, but no longer
//!   fresh OS entropy; the choice is visible in the type parameter.

use blake3::Hasher;
use rand_chacha::ChaCha20Rng;
use rand_core::{OsRng, RngCore, SeedableRng};
use thiserror::Error;

/// Domain separator for label-derived seeds.
const SEED_DOMAIN: &[u8] = b"ecg-synth-seed-v1";

/// Scale factor mapping a 32-bit word onto `[0, 1)`.
const WORD_SCALE: f64 = 1.0 / 4_294_967_296.0;

/// Default number of words drawn per refill.
pub const DEFAULT_CACHE_SIZE: usize = 10_000;

/// Errors that can occur while setting up the random source.
#[derive(Debug, Error)]
pub enum RandomError {
    #[error("entropy source unavailable: {0}")]
    EntropyUnavailable(String),
    #[error("random cache size must be non-zero")]
    EmptyCache,
}

/// Uniform random source backed by a refilling cache.
///
/// Every component that needs randomness draws through one of these;
/// nothing reads the underlying generator directly.
pub struct UniformRandomSource<R: RngCore = OsRng> {
    /// Underlying generator.
    rng: R,
    /// Pre-drawn variates in `[0, 1)`.
    cache: Vec<f64>,
    /// Next unread position in `cache`.
    cursor: usize,
    /// Scratch buffer for raw bytes, reused across refills.
    scratch: Vec<u8>,
    /// Total variates served.
    draws: u64,
    /// Total refills performed, including the initial fill.
    refills: u64,
}

impl UniformRandomSource<OsRng> {
    /// Creates a source backed by the OS entropy source.
    ///
    /// The first block is drawn eagerly so an unavailable source is
    /// reported here rather than on first use.
    pub fn from_os_entropy(cache_size: usize) -> Result<Self, RandomError> {
        Self::with_rng(OsRng, cache_size)
    }
}

impl UniformRandomSource<ChaCha20Rng> {
    /// Creates a reproducible source from a numeric seed.
    pub fn seeded(seed: u64, cache_size: usize) -> Result<Self, RandomError> {
        Self::with_rng(ChaCha20Rng::seed_from_u64(seed), cache_size)
    }

    /// Creates a reproducible source from a text label.
    ///
    /// seed = BLAKE3(domain || label)
    pub fn from_label(label: &str, cache_size: usize) -> Result<Self, RandomError> {
        let mut hasher = Hasher::new();
        hasher.update(SEED_DOMAIN);
        hasher.update(label.as_bytes());
        let seed: [u8; 32] = *hasher.finalize().as_bytes();

        Self::with_rng(ChaCha20Rng::from_seed(seed), cache_size)
    }
}

impl<R: RngCore> UniformRandomSource<R> {
    /// Creates a source over an arbitrary generator.
    pub fn with_rng(rng: R, cache_size: usize) -> Result<Self, RandomError> {
        if cache_size == 0 {
            return Err(RandomError::EmptyCache);
        }

        let mut source = Self {
            rng,
            cache: Vec::with_capacity(cache_size),
            cursor: 0,
            scratch: vec![0u8; cache_size * 4],
            draws: 0,
            refills: 0,
        };

        source
            .rng
            .try_fill_bytes(&mut source.scratch)
            .map_err(|e| RandomError::EntropyUnavailable(e.to_string()))?;
        source.load_scratch();

        tracing::debug!(cache_size, "Random cache initialized");
        Ok(source)
    }

    /// Returns a variate uniformly distributed in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        if self.cursor == self.cache.len() {
            self.refill();
        }
        let value = self.cache[self.cursor];
        self.cursor += 1;
        self.draws += 1;
        value
    }

    /// Returns a variate uniformly distributed in `[min, max)`.
    #[inline]
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next() * (max - min)
    }

    /// Returns `true` with the given probability.
    #[inline]
    pub fn chance(&mut self, probability: f64) -> bool {
        self.next() < probability
    }

    /// Returns the number of cached variates not yet served.
    pub fn remaining(&self) -> usize {
        self.cache.len() - self.cursor
    }

    /// Returns the number of words drawn per refill.
    pub fn cache_size(&self) -> usize {
        self.scratch.len() / 4
    }

    /// Returns the total number of variates served.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Returns the number of refills, including the initial fill.
    pub fn refills(&self) -> u64 {
        self.refills
    }

    // OsRng's fill_bytes panics if the OS source fails after construction.
    // That is the intended behavior: no degraded fallback.
    fn refill(&mut self) {
        self.rng.fill_bytes(&mut self.scratch);
        self.load_scratch();
        tracing::trace!(refills = self.refills, "Random cache refilled");
    }

    fn load_scratch(&mut self) {
        self.cache.clear();
        self.cache.extend(
            self.scratch
                .chunks_exact(4)
                .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]) as f64 * WORD_SCALE),
        );
        self.cursor = 0;
        self.refills += 1;
    }
}

impl<R: RngCore> std::fmt::Debug for UniformRandomSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniformRandomSource")
            .field("cache_size", &self.cache_size())
            .field("remaining", &self.remaining())
            .field("draws", &self.draws)
            .field("refills", &self.refills)
            .finish_non_exhaustive()
    }
}
