//! # Bakeflow
//!
//! An asynchronous three-stage production pipeline: make, bake, pack.
//!
//! Each item is processed by one invocation that:
//!
//! - **Makes** the item for a random number of time units
//! - **Bakes** it while it sits in a shared tracking table
//! - **Restarts** from make whenever the bake runs long enough to burn
//! - **Packs** it and hands back the same item it was given
//!
//! Cancellation is cooperative and observed at every wait. Each stage is
//! traced as a span and every stage boundary is logged as a structured event.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bakeflow::prelude::*;
//!
//! # async fn run() -> BakeryResult<()> {
//! init_logging(LogProfile::Development);
//!
//! let bakery = Bakery::new(BakeryConfig::default().with_env_overrides()?)?;
//! let order = Order::create(ItemType::Margherita);
//!
//! let item = bakery.process(order.into_item(), &CancellationToken::new()).await?;
//! println!("packed {} ({})", item.id, item.item_type);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod durations;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod testing;
pub mod tracking;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{CancellationToken, CleanupGuard};
    pub use crate::config::BakeryConfig;
    pub use crate::core::{Client, Item, ItemId, ItemType, Order, PipelineState, StageName};
    pub use crate::durations::{
        DurationSource, RandomDurationSource, ScriptedDurationSource, StageTiming,
    };
    pub use crate::errors::{BakeryError, BakeryResult, BurntError, ConfigError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{
        init_logging, Instrumentation, LogProfile, LoggingTracer, NoOpTracer, Tracer,
    };
    pub use crate::pipeline::{Bakery, ItemProcessor, ProcessReport, RestartPolicy};
    pub use crate::tracking::TrackingTable;
    pub use crate::utils::{generate_uuid, iso_timestamp, Timestamp};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_exports_pipeline() {
        let bakery = Bakery::new(BakeryConfig::default());
        assert!(bakery.is_ok());
    }
}
