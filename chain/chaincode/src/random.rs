//! Random sources
//!
//! The `random` entry point draws from an injected `RandomSource`. The
//! production source is deliberately non-cryptographic: every draw builds a
//! fresh ChaCha8 generator seeded from the wall clock. Tests substitute a
//! fixed or scripted source.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of `u64` samples for the `random` entry point.
pub trait RandomSource: Send + Sync {
    fn next_u64(&self) -> u64;
}

/// Reseeds from wall-clock time on every draw.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeSeededSource;

impl TimeSeededSource {
    fn seed() -> u64 {
        let now = Utc::now();
        match now.timestamp_nanos_opt() {
            Some(nanos) => nanos as u64,
            None => now.timestamp() as u64,
        }
    }
}

impl RandomSource for TimeSeededSource {
    fn next_u64(&self) -> u64 {
        ChaCha8Rng::seed_from_u64(Self::seed()).next_u64()
    }
}

/// Always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedSource(pub u64);

impl RandomSource for FixedSource {
    fn next_u64(&self) -> u64 {
        self.0
    }
}

/// Cycles through a fixed list of values.
#[derive(Debug)]
pub struct SequenceSource {
    values: Vec<u64>,
    next: AtomicUsize,
}

impl SequenceSource {
    /// # Panics
    /// Panics if `values` is empty.
    pub fn new(values: Vec<u64>) -> Self {
        assert!(!values.is_empty(), "SequenceSource needs at least one value");
        Self {
            values,
            next: AtomicUsize::new(0),
        }
    }
}

impl RandomSource for SequenceSource {
    fn next_u64(&self) -> u64 {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.values.len();
        self.values[index]
    }
}
