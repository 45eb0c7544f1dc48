//! Uniform random durations.

use super::{DurationSource, StageTiming};
use crate::core::StageName;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws durations uniformly from each stage's range.
///
/// Owns its generator; concurrent pipelines sharing one source serialize on
/// a short lock per draw.
pub struct RandomDurationSource {
    rng: Mutex<StdRng>,
}

impl RandomDurationSource {
    /// Creates a source seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a reproducible source.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Creates a seeded source if `seed` is set, an entropy-seeded one otherwise.
    #[must_use]
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::seeded)
    }
}

impl Default for RandomDurationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DurationSource for RandomDurationSource {
    fn draw(&self, _stage: StageName, timing: StageTiming) -> u64 {
        if timing.min >= timing.max {
            return timing.min;
        }
        self.rng.lock().gen_range(timing.min..=timing.max)
    }
}

impl std::fmt::Debug for RandomDurationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomDurationSource").finish_non_exhaustive()
    }
}
