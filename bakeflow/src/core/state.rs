//! Stage names and pipeline states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One sequential phase of processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Prepare the item.
    Make,
    /// Put the item in the oven.
    Bake,
    /// Box the item.
    Pack,
}

impl StageName {
    /// Stages in execution order.
    pub const ORDER: [Self; 3] = [Self::Make, Self::Bake, Self::Pack];

    /// Span name used for this stage.
    #[must_use]
    pub fn span_name(self) -> &'static str {
        match self {
            Self::Make => "bakery.make",
            Self::Bake => "bakery.bake",
            Self::Pack => "bakery.pack",
        }
    }

    /// The pipeline state active while this stage runs.
    #[must_use]
    pub fn state(self) -> PipelineState {
        match self {
            Self::Make => PipelineState::Making,
            Self::Bake => PipelineState::Baking,
            Self::Pack => PipelineState::Packing,
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Make => write!(f, "make"),
            Self::Bake => write!(f, "bake"),
            Self::Pack => write!(f, "pack"),
        }
    }
}

/// State of a single pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Running the make stage.
    Making,
    /// Running the bake stage; the item is in the tracking table.
    Baking,
    /// Running the pack stage.
    Packing,
    /// Finished successfully.
    Done,
    /// The bake stage burnt the item; the pipeline restarts from make.
    Burnt,
    /// Cancelled by the caller.
    Cancelled,
}

impl PipelineState {
    /// Returns true for states that end the invocation.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// Returns true if `next` is a legal successor of this state.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (s, _) if s.is_terminal() => false,
            (_, Self::Cancelled) => true,
            (Self::Making, Self::Baking)
            | (Self::Baking, Self::Packing | Self::Burnt)
            | (Self::Packing, Self::Done)
            | (Self::Burnt, Self::Making) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Making => write!(f, "making"),
            Self::Baking => write!(f, "baking"),
            Self::Packing => write!(f, "packing"),
            Self::Done => write!(f, "done"),
            Self::Burnt => write!(f, "burnt"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}
