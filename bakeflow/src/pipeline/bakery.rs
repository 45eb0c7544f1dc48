//! The bakery pipeline: make, bake, pack, restart on burnt.

use super::report::{ProcessReport, StageDurations, StateTrail};
use super::retry::{RestartDecision, RestartState};
use crate::cancellation::CancellationToken;
use crate::config::BakeryConfig;
use crate::core::{Item, PipelineState, StageName};
use crate::durations::{DurationSource, RandomDurationSource};
use crate::errors::{BakeryError, BakeryResult};
use crate::observability::{BakerySpanAttributes, Instrumentation, SpanScope};
use crate::tracking::TrackingTable;
use serde_json::json;
use std::sync::Arc;
use tracing::Level;

/// Drives items through make, bake and pack.
///
/// One `Bakery` serves any number of concurrent invocations; they share the
/// tracking table and the duration source.
pub struct Bakery {
    pub(super) config: BakeryConfig,
    pub(super) table: Arc<TrackingTable>,
    pub(super) durations: Arc<dyn DurationSource>,
    pub(super) instrumentation: Instrumentation,
}

impl Bakery {
    /// Creates a bakery with a random duration source and no-op instrumentation.
    pub fn new(config: BakeryConfig) -> BakeryResult<Self> {
        config.validate()?;
        let durations = Arc::new(RandomDurationSource::from_seed(config.seed));
        Ok(Self {
            config,
            table: Arc::new(TrackingTable::new()),
            durations,
            instrumentation: Instrumentation::noop(),
        })
    }

    /// Replaces the duration source.
    #[must_use]
    pub fn with_durations(mut self, durations: Arc<dyn DurationSource>) -> Self {
        self.durations = durations;
        self
    }

    /// Shares an existing tracking table.
    #[must_use]
    pub fn with_table(mut self, table: Arc<TrackingTable>) -> Self {
        self.table = table;
        self
    }

    /// Replaces the instrumentation.
    #[must_use]
    pub fn with_instrumentation(mut self, instrumentation: Instrumentation) -> Self {
        self.instrumentation = instrumentation;
        self
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &BakeryConfig {
        &self.config
    }

    /// The tracking table.
    #[must_use]
    pub fn table(&self) -> &Arc<TrackingTable> {
        &self.table
    }

    /// Processes an item to completion.
    ///
    /// Returns the packed item, or [`BakeryError::Cancelled`] once `cancel`
    /// fires. Burnt bakes are retried internally and never returned.
    pub async fn process(&self, item: Item, cancel: &CancellationToken) -> BakeryResult<Item> {
        self.process_detailed(item, cancel).await.map(|report| report.item)
    }

    /// Like [`process`](Self::process), returning the full report.
    pub async fn process_detailed(
        &self,
        item: Item,
        cancel: &CancellationToken,
    ) -> BakeryResult<ProcessReport> {
        let attrs = BakerySpanAttributes::for_item(&item).to_otel_attributes();
        let span = self.instrumentation.span("bakery.process", &attrs);
        self.instrumentation.event(Level::INFO, "process.started", &item, None);

        let mut trail = StateTrail::new();
        let mut restart = RestartState::new();
        let mut bake_durations = Vec::new();

        loop {
            let outcome = self
                .run_attempt(&item, restart.attempt(), &mut trail, &mut bake_durations, cancel)
                .await;

            let err = match outcome {
                Ok((item, final_durations)) => {
                    trail.enter(PipelineState::Done);
                    self.instrumentation.event(
                        Level::INFO,
                        "process.completed",
                        &item,
                        Some(json!({
                            "restarts": restart.restarts(),
                            "units": final_durations.total(),
                        })),
                    );
                    return Ok(ProcessReport {
                        item,
                        restarts: restart.restarts(),
                        trail,
                        bake_durations,
                        final_durations,
                    });
                }
                Err(err) => err,
            };

            match err {
                BakeryError::Burnt(burnt) => {
                    trail.enter(PipelineState::Burnt);
                    self.instrumentation.event(
                        Level::WARN,
                        "process.burnt",
                        &item,
                        Some(json!({ "attempt": restart.attempt(), "duration": burnt.duration })),
                    );
                    match restart.decide(&self.config.restart) {
                        RestartDecision::Restart(backoff) => {
                            if !backoff.is_zero() {
                                if let Err(err) = self.pause(backoff, &item, cancel).await {
                                    return Err(self.abort(&item, &span, &mut trail, err));
                                }
                            }
                        }
                        RestartDecision::GiveUp => {
                            let err = BakeryError::RestartsExhausted {
                                id: item.id.clone(),
                                restarts: restart.restarts(),
                            };
                            return Err(self.abort(&item, &span, &mut trail, err));
                        }
                    }
                }
                err => return Err(self.abort(&item, &span, &mut trail, err)),
            }
        }
    }

    /// One pass through make, bake and pack.
    async fn run_attempt(
        &self,
        item: &Item,
        attempt: u32,
        trail: &mut StateTrail,
        bake_durations: &mut Vec<u64>,
        cancel: &CancellationToken,
    ) -> BakeryResult<(Item, StageDurations)> {
        trail.enter(StageName::Make.state());
        let make = self.make(item, attempt, cancel).await?;

        trail.enter(StageName::Bake.state());
        let (baked, bake) = self.bake(item, attempt, bake_durations, cancel).await?;

        trail.enter(StageName::Pack.state());
        let pack = self.pack(&baked, attempt, cancel).await?;

        Ok((baked, StageDurations { make, bake, pack }))
    }

    /// Terminal failure: clean up, report, and hand the error back.
    fn abort(
        &self,
        item: &Item,
        span: &SpanScope,
        trail: &mut StateTrail,
        err: BakeryError,
    ) -> BakeryError {
        if err.is_cancelled() {
            self.table.remove(&item.id);
            trail.enter(PipelineState::Cancelled);
        }
        span.fail(&err);

        let event_type = if err.is_cancelled() {
            "process.cancelled"
        } else {
            "process.failed"
        };
        self.instrumentation.event(
            Level::ERROR,
            event_type,
            item,
            Some(serde_json::Value::Object(err.to_dict().into_iter().collect())),
        );
        err
    }
}

impl std::fmt::Debug for Bakery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bakery")
            .field("config", &self.config)
            .field("in_flight", &self.table.len())
            .finish_non_exhaustive()
    }
}
