//! Per-invocation record of what the pipeline did.

use crate::core::{Item, PipelineState};
use serde::{Deserialize, Serialize};

/// Ordered list of states visited by one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTrail {
    states: Vec<PipelineState>,
}

impl StateTrail {
    /// Creates an empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records entry into `next`.
    ///
    /// The first state must be `Making`; every later one must be a legal
    /// successor of the current state.
    pub fn enter(&mut self, next: PipelineState) {
        debug_assert!(
            self.current().map_or(next == PipelineState::Making, |cur| cur.can_transition_to(next)),
            "illegal transition {:?} -> {next}",
            self.current()
        );
        self.states.push(next);
    }

    /// The state most recently entered.
    #[must_use]
    pub fn current(&self) -> Option<PipelineState> {
        self.states.last().copied()
    }

    /// All visited states.
    #[must_use]
    pub fn states(&self) -> &[PipelineState] {
        &self.states
    }

    /// How many times `state` was entered.
    #[must_use]
    pub fn count(&self, state: PipelineState) -> usize {
        self.states.iter().filter(|s| **s == state).count()
    }
}

/// Durations drawn by one complete attempt, in time units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDurations {
    /// Make duration.
    pub make: u64,
    /// Bake duration.
    pub bake: u64,
    /// Pack duration.
    pub pack: u64,
}

impl StageDurations {
    /// Sum over all stages.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.make + self.bake + self.pack
    }
}

/// Result of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessReport {
    /// The finished item.
    pub item: Item,
    /// Number of full-pipeline restarts.
    pub restarts: u32,
    /// Every state the invocation passed through.
    pub trail: StateTrail,
    /// Every bake duration drawn, in order, burnt ones included.
    pub bake_durations: Vec<u64>,
    /// Durations of the attempt that completed.
    pub final_durations: StageDurations,
}

impl ProcessReport {
    /// Number of attempts, the successful one included.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.restarts + 1
    }
}
