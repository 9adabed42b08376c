//! Deterministic math utilities
//!
//! Re-exports the glam vector types used for centroids plus a seeded RNG
//! for producers that need reproducible randomness.

pub use glam::{dvec2, DVec2};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Default seed used when no explicit seed is provided.
pub const DEFAULT_SEED: u64 = 42;

/// Seeded, platform-independent random source.
///
/// The partitioner itself never draws random numbers; only grid producers
/// do, and they must go through this type so identical seeds give
/// identical grids.
pub struct DeterministicRng {
    seed: u64,
    state: ChaCha8Rng,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            state: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state.gen()
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state.gen()
    }

    /// Uniform in `[low, high)`; returns `low` for an empty range.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.state.gen_range(low..high)
    }

    /// Normal sample via the Box-Muller transform.
    pub fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        // 1 - u keeps the log argument in (0, 1].
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
