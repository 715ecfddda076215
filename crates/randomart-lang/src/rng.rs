//! Seedable uniform random source driving tree generation.
//!
//! Uses SplitMix64: the same seed yields the same sequence on every platform,
//! which is what makes a generated tree reproducible from its seed.

use std::time::{SystemTime, UNIX_EPOCH};

const GOLDEN_GAMMA: u64 = 0x9E3779B97F4A7C15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngStream {
    state: u64,
}

impl RngStream {
    /// Every seed, zero included, starts its own sequence.
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed taken from the wall clock, for runs that did not ask for one.
    pub fn clock_seed() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
            .unwrap_or(GOLDEN_GAMMA)
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        mix(self.state)
    }

    /// Uniform value in `[0, 1)`.
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        // upper 53 bits fill the f64 mantissa
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform value in `[min, max)`.
    #[inline]
    pub fn uniform_range(&mut self, min: f64, max: f64) -> f64 {
        debug_assert!(max > min);
        min + self.uniform() * (max - min)
    }
}

#[inline]
const fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
