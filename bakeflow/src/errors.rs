//! Error types for the bakeflow pipeline.
//!
//! The taxonomy separates the one transient fault the pipeline recovers from
//! on its own ([`BurntError`]) from the faults that always reach the caller.

use crate::core::{ItemId, StageName};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for bakeflow operations.
#[derive(Debug, Error)]
pub enum BakeryError {
    /// The bake stage drew a duration at or above the burnt threshold.
    ///
    /// Recovered internally by restarting the pipeline; only observable by
    /// callers of individual stages.
    #[error("{0}")]
    Burnt(#[from] BurntError),

    /// The cancellation token fired while the item was in flight.
    #[error("Processing of item '{id}' cancelled: {reason}")]
    Cancelled {
        /// The item being processed.
        id: ItemId,
        /// The reason attached to the cancellation token.
        reason: String,
    },

    /// A finite restart budget was configured and has been used up.
    #[error("Item '{id}' burnt {restarts} times, giving up")]
    RestartsExhausted {
        /// The item being processed.
        id: ItemId,
        /// Number of restarts performed before giving up.
        restarts: u32,
    },

    /// The bake entry vanished from the tracking table before it was taken.
    #[error("Tracking entry for item '{id}' missing at end of bake")]
    TrackingEntryMissing {
        /// The item whose entry was expected.
        id: ItemId,
    },

    /// A second bake was started for an id that is already in the oven.
    #[error("Item '{id}' is already baking")]
    AlreadyBaking {
        /// The conflicting item id.
        id: ItemId,
    },

    /// Invalid configuration.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl BakeryError {
    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(id: ItemId, reason: impl Into<String>) -> Self {
        Self::Cancelled {
            id,
            reason: reason.into(),
        }
    }

    /// Returns true if this error is recovered by a pipeline restart.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Burnt(_))
    }

    /// Returns true if this is a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Short machine-readable name of the variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Burnt(_) => "BurntItem",
            Self::Cancelled { .. } => "Cancelled",
            Self::RestartsExhausted { .. } => "RestartsExhausted",
            Self::TrackingEntryMissing { .. } => "TrackingEntryMissing",
            Self::AlreadyBaking { .. } => "AlreadyBaking",
            Self::Config(_) => "Config",
        }
    }

    /// Converts to a dictionary representation for event payloads.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), json!(self.kind()));

        match self {
            Self::Burnt(err) => {
                map.insert("id".to_string(), json!(err.id.as_str()));
                map.insert("duration".to_string(), json!(err.duration));
                map.insert("threshold".to_string(), json!(err.threshold));
            }
            Self::Cancelled { id, reason } => {
                map.insert("id".to_string(), json!(id.as_str()));
                map.insert("reason".to_string(), json!(reason));
            }
            Self::RestartsExhausted { id, restarts } => {
                map.insert("id".to_string(), json!(id.as_str()));
                map.insert("restarts".to_string(), json!(restarts));
            }
            Self::TrackingEntryMissing { id } | Self::AlreadyBaking { id } => {
                map.insert("id".to_string(), json!(id.as_str()));
            }
            Self::Config(_) => {}
        }

        map.insert("message".to_string(), json!(self.to_string()));
        map
    }
}

/// The transient bake failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Item '{id}' is burnt: baked for {duration} units (threshold {threshold})")]
pub struct BurntError {
    /// The burnt item.
    pub id: ItemId,
    /// The drawn bake duration, in time units.
    pub duration: u64,
    /// The threshold the duration reached.
    pub threshold: u64,
}

impl BurntError {
    /// Creates a new burnt error.
    #[must_use]
    pub fn new(id: ItemId, duration: u64, threshold: u64) -> Self {
        Self {
            id,
            duration,
            threshold,
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A stage timing range has `min > max`.
    #[error("Invalid timing for stage {stage}: min {min} exceeds max {max}")]
    InvertedRange {
        /// The offending stage.
        stage: StageName,
        /// Configured lower bound.
        min: u64,
        /// Configured upper bound.
        max: u64,
    },

    /// The burnt threshold is zero, which would burn every item.
    #[error("Burnt threshold must be greater than zero")]
    ZeroThreshold,

    /// Every possible bake burns and nothing bounds the restarts, so
    /// processing could never finish.
    #[error(
        "Burnt threshold {threshold} is at or below the shortest bake ({bake_min}) with unbounded restarts"
    )]
    AlwaysBurnt {
        /// Configured burnt threshold.
        threshold: u64,
        /// Shortest bake duration.
        bake_min: u64,
    },

    /// An environment override could not be parsed.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv {
        /// The environment variable name.
        var: String,
        /// The raw value.
        value: String,
    },

    /// The configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias.
pub type BakeryResult<T> = Result<T, BakeryError>;
