//! Core domain model types for bakeflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - The item and its id/type
//! - The order envelope
//! - Stage names and pipeline states

mod item;
mod order;
mod state;

pub use item::{Item, ItemId, ItemType};
pub use order::{Client, Order};
pub use state::{PipelineState, StageName};
