//! Seeded RNG for planning hooks and scenario generation.
//!
//! Backed by `ChaCha8Rng`, whose output stream is specified and portable,
//! so a seed reproduces the same sequence on every platform and release.
//! The stepping engine itself draws no random numbers.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic random source for one simulation run.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    seed: u64,
    inner: ChaCha8Rng,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// The seed this generator was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Integer in `[min_inclusive, max_exclusive)`. Returns `min_inclusive`
    /// for an empty range.
    pub fn next_int(&mut self, min_inclusive: i64, max_exclusive: i64) -> i64 {
        if max_exclusive <= min_inclusive {
            return min_inclusive;
        }
        self.inner.gen_range(min_inclusive..max_exclusive)
    }

    /// Float in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.inner.r#gen::<f32>()
    }

    /// Float in `[min_inclusive, max_exclusive)`.
    pub fn next_range(&mut self, min_inclusive: f32, max_exclusive: f32) -> f32 {
        min_inclusive + (max_exclusive - min_inclusive) * self.next_f32()
    }

    /// `true` with probability `p`, clamped to `[0, 1]`.
    pub fn next_bool(&mut self, p: f32) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.next_f32() < p
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }

    /// A random element, or `None` when `items` is empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }
}
