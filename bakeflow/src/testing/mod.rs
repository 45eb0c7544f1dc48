//! Testing utilities for bakeflow pipelines.
//!
//! This module provides:
//! - A recording tracer
//! - Assertions over items, the tracking table and results
//! - A bakery fixture wired to recording collaborators

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_cancelled, assert_not_tracked, assert_same_item};
pub use fixtures::TestBakery;
pub use mocks::{RecordingTracer, TraceRecord};
