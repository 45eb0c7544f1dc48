//! The bakery pipeline.
//!
//! This module provides:
//! - The [`Bakery`] state machine (make, bake, pack)
//! - The restart policy applied after a burnt bake
//! - Per-invocation reports
//! - The [`ItemProcessor`] trait seam

mod bakery;
mod interfaces;
mod integration_tests;
mod report;
mod retry;
mod stages;

pub use bakery::Bakery;
pub use interfaces::ItemProcessor;
pub use report::{ProcessReport, StageDurations, StateTrail};
pub use retry::{RestartDecision, RestartPolicy, RestartState};
