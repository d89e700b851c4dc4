//! Deterministic object bodies.

use bytes::Bytes;
use rand::SeedableRng;
use rand::distr::{Alphanumeric, SampleString};
use rand::rngs::SmallRng;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 0x626f_6c74;

/// Generates alphanumeric bodies of a fixed length.
///
/// Each body is derived from the generator seed and the index of its key only, so the baseline
/// store and the proxy receive byte-identical bodies for the same key, across runs.
#[derive(Clone, Copy, Debug)]
pub struct PayloadGenerator {
    seed: u64,
    length: usize,
}

impl PayloadGenerator {
    /// Creates a generator for bodies of `length` bytes.
    pub fn new(length: usize) -> Self {
        Self::with_seed(DEFAULT_SEED, length)
    }

    /// Creates a generator with an explicit seed.
    pub fn with_seed(seed: u64, length: usize) -> Self {
        Self { seed, length }
    }

    /// Returns the body for the key at `index`.
    pub fn payload(&self, index: usize) -> Bytes {
        let mut rng = SmallRng::seed_from_u64(self.seed.wrapping_add(index as u64));
        Bytes::from(Alphanumeric.sample_string(&mut rng, self.length))
    }
}
