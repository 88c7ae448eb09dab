//! Random number sources.
//!
//! The simulation never touches system randomness directly. Generation and
//! enemy AI draw from a [`RandomSource`] owned by the game instance, so a
//! seeded source reproduces a whole game and a scripted source pins down
//! individual decisions in tests.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Supplier of uniform random draws.
pub trait RandomSource {
    /// Uniform integer in `0..upper`.
    ///
    /// Returns 0 when `upper` is 0 or 1.
    fn below(&mut self, upper: u32) -> u32;

    /// Fair coin flip.
    fn coin(&mut self) -> bool {
        self.below(2) == 0
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn below(&mut self, upper: u32) -> u32 {
        (**self).below(upper)
    }

    fn coin(&mut self) -> bool {
        (**self).coin()
    }
}

/// Deterministic RNG seeded from a `u64`.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededRandom {
    /// Create a source from an explicit seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a source with a seed drawn from the thread RNG.
    ///
    /// The seed is still recorded so the game can be replayed.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    /// Seed this source was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn below(&mut self, upper: u32) -> u32 {
        if upper <= 1 {
            return 0;
        }
        self.rng.gen_range(0..upper)
    }
}

/// Replays a fixed sequence of draws.
///
/// Each call to [`below`](RandomSource::below) consumes one scripted value
/// and reduces it modulo `upper`. Once the script runs out every draw
/// yields the fallback value.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    draws: VecDeque<u32>,
    fallback: u32,
    taken: usize,
}

impl ScriptedRandom {
    /// Create a source replaying `draws`, then falling back to 0.
    #[must_use]
    pub fn new(draws: impl IntoIterator<Item = u32>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            fallback: 0,
            taken: 0,
        }
    }

    /// Create a source that always yields `value`.
    #[must_use]
    pub fn constant(value: u32) -> Self {
        Self {
            draws: VecDeque::new(),
            fallback: value,
            taken: 0,
        }
    }

    /// Set the value yielded after the script is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, value: u32) -> Self {
        self.fallback = value;
        self
    }

    /// Append more draws to the script.
    pub fn push(&mut self, draws: impl IntoIterator<Item = u32>) {
        self.draws.extend(draws);
    }

    /// Number of draws consumed so far.
    #[must_use]
    pub const fn taken(&self) -> usize {
        self.taken
    }

    /// Number of scripted draws not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn below(&mut self, upper: u32) -> u32 {
        self.taken += 1;
        let raw = self.draws.pop_front().unwrap_or(self.fallback);
        if upper <= 1 {
            0
        } else {
            raw % upper
        }
    }
}
