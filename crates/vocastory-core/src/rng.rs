//! Random number generator abstraction for determinism.
//!
//! The play loop samples actions and stories through this trait. In
//! production it wraps a real RNG; in tests a scripted implementation is
//! injected so routing decisions are repeatable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a random `u32` in the range `[min, max]` inclusive.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;

    /// Generate a random `f64` in `[0.0, 1.0)`.
    fn next_f64(&mut self) -> f64;

    /// Picks a uniformly distributed index into a collection of `len` items.
    /// Returns `None` for an empty collection.
    fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let max = u32::try_from(len - 1).unwrap_or(u32::MAX);
        let picked = self.next_u32_range(0, max) as usize;
        Some(picked.min(len - 1))
    }
}

/// Production RNG backed by `rand`'s standard generator.
#[derive(Debug)]
pub struct StdDeterministicRng {
    inner: StdRng,
}

impl StdDeterministicRng {
    /// Creates an RNG seeded from the operating system.
    #[must_use]
    pub fn from_os_rng() -> Self {
        Self {
            inner: StdRng::from_os_rng(),
        }
    }

    /// Creates an RNG from a fixed seed, for reproducible runs.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl DeterministicRng for StdDeterministicRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.inner.random_range(min..=max)
    }

    fn next_f64(&mut self) -> f64 {
        self.inner.random::<f64>()
    }
}
