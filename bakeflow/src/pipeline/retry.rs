//! Restart policy applied after a burnt bake.
//!
//! A burnt item restarts the whole pipeline from make. By default there is no
//! limit and no pause between attempts.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for pipeline restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicy {
    /// Maximum number of restarts; `None` restarts forever.
    #[serde(default)]
    pub max_restarts: Option<u32>,
    /// Pause before each restart, in milliseconds.
    #[serde(default)]
    pub backoff_ms: u64,
}

impl RestartPolicy {
    /// Restarts forever without pausing.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Gives up after `max_restarts` restarts.
    #[must_use]
    pub fn bounded(max_restarts: u32) -> Self {
        Self {
            max_restarts: Some(max_restarts),
            ..Self::default()
        }
    }

    /// Sets the pause before each restart.
    #[must_use]
    pub fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }

    /// The pause before each restart.
    #[must_use]
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Outcome of a restart decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Restart after the specified pause.
    Restart(Duration),
    /// The budget is spent.
    GiveUp,
}

/// Restart bookkeeping for one pipeline invocation.
#[derive(Debug, Default)]
pub struct RestartState {
    restarts: u32,
}

impl RestartState {
    /// Creates a fresh state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restarts performed so far.
    #[must_use]
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// The 1-based number of the attempt currently running.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.restarts.saturating_add(1)
    }

    /// Returns true if no further restart is allowed.
    #[must_use]
    pub fn is_exhausted(&self, policy: &RestartPolicy) -> bool {
        policy.max_restarts.is_some_and(|max| self.restarts >= max)
    }

    /// Decides whether to restart and counts the restart if so.
    pub fn decide(&mut self, policy: &RestartPolicy) -> RestartDecision {
        if self.is_exhausted(policy) {
            return RestartDecision::GiveUp;
        }
        self.restarts = self.restarts.saturating_add(1);
        RestartDecision::Restart(policy.backoff())
    }
}
