//! Deterministic, pre-scripted durations.

use super::{DurationSource, StageTiming};
use crate::core::StageName;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Replays a fixed script of durations per stage.
///
/// Once a stage's script runs out it falls back to the stage's minimum, so a
/// script only needs to spell out the draws a scenario cares about.
#[derive(Debug, Default)]
pub struct ScriptedDurationSource {
    scripts: Mutex<HashMap<StageName, VecDeque<u64>>>,
    draws: Mutex<HashMap<StageName, usize>>,
}

impl ScriptedDurationSource {
    /// Creates an empty script; every draw yields the stage minimum.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends durations for a stage.
    #[must_use]
    pub fn with(self, stage: StageName, units: impl IntoIterator<Item = u64>) -> Self {
        self.scripts
            .lock()
            .entry(stage)
            .or_default()
            .extend(units);
        self
    }

    /// Appends bake durations.
    #[must_use]
    pub fn with_bake(self, units: impl IntoIterator<Item = u64>) -> Self {
        self.with(StageName::Bake, units)
    }

    /// Number of draws made for a stage so far.
    #[must_use]
    pub fn draws(&self, stage: StageName) -> usize {
        self.draws.lock().get(&stage).copied().unwrap_or(0)
    }

    /// Number of scripted values not yet consumed for a stage.
    #[must_use]
    pub fn remaining(&self, stage: StageName) -> usize {
        self.scripts.lock().get(&stage).map_or(0, VecDeque::len)
    }
}

impl DurationSource for ScriptedDurationSource {
    fn draw(&self, stage: StageName, timing: StageTiming) -> u64 {
        *self.draws.lock().entry(stage).or_default() += 1;
        self.scripts
            .lock()
            .get_mut(&stage)
            .and_then(VecDeque::pop_front)
            .unwrap_or(timing.min)
    }
}
