//! The three stages and the cancellable wait they share.

use super::bakery::Bakery;
use crate::cancellation::{CancellationToken, CleanupGuard};
use crate::core::{Item, StageName};
use crate::errors::{BakeryError, BakeryResult, BurntError};
use crate::observability::{BakerySpanAttributes, SpanScope};
use serde_json::json;
use std::time::Duration;
use tracing::Level;

impl Bakery {
    /// Draws a duration for `stage` from the configured range.
    fn draw(&self, stage: StageName) -> u64 {
        self.durations.draw(stage, self.config.timing(stage))
    }

    fn stage_span(&self, stage: StageName, item: &Item, attempt: u32, units: u64) -> SpanScope {
        let attrs = BakerySpanAttributes::for_item(item)
            .with_stage(stage)
            .with_attempt(attempt)
            .with_duration_units(units)
            .to_otel_attributes();
        self.instrumentation.span(stage.span_name(), &attrs)
    }

    /// Waits `units` time units unless cancelled first.
    async fn hold(&self, units: u64, item: &Item, cancel: &CancellationToken) -> BakeryResult<()> {
        let wait = Duration::from_millis(self.config.time_unit_ms.saturating_mul(units));
        self.pause(wait, item, cancel).await
    }

    /// Sleeps for `wait`, resolving as cancelled if the token fires first.
    ///
    /// Cancellation wins ties.
    pub(super) async fn pause(
        &self,
        wait: Duration,
        item: &Item,
        cancel: &CancellationToken,
    ) -> BakeryResult<()> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(BakeryError::cancelled(
                item.id.clone(),
                cancel.reason().unwrap_or_default(),
            )),
            () = tokio::time::sleep(wait) => Ok(()),
        }
    }

    pub(super) async fn make(
        &self,
        item: &Item,
        attempt: u32,
        cancel: &CancellationToken,
    ) -> BakeryResult<u64> {
        let units = self.draw(StageName::Make);
        let span = self.stage_span(StageName::Make, item, attempt, units);
        self.instrumentation.event(
            Level::INFO,
            "make.started",
            item,
            Some(json!({ "attempt": attempt, "duration": units })),
        );

        self.hold(units, item, cancel).await.map_err(|err| {
            span.fail(&err);
            err
        })?;
        Ok(units)
    }

    /// Bakes the item while it sits in the tracking table.
    ///
    /// The entry is inserted before the wait and gone when this returns, on
    /// every path: completion takes it, a burnt bake or cancellation removes
    /// it, and a dropped future removes it through the guard.
    pub(super) async fn bake(
        &self,
        item: &Item,
        attempt: u32,
        bake_durations: &mut Vec<u64>,
        cancel: &CancellationToken,
    ) -> BakeryResult<(Item, u64)> {
        let units = self.draw(StageName::Bake);
        bake_durations.push(units);
        let span = self.stage_span(StageName::Bake, item, attempt, units);

        if let Err(err) = self.table.put(item.id.clone(), item.clone()) {
            span.fail(&err);
            return Err(err);
        }
        let mut guard = {
            let table = self.table.clone();
            let id = item.id.clone();
            CleanupGuard::new(move || {
                table.remove(&id);
            })
        };
        self.instrumentation.event(
            Level::INFO,
            "bake.pushed",
            item,
            Some(json!({ "attempt": attempt, "duration": units })),
        );

        if let Err(err) = self.hold(units, item, cancel).await {
            drop(guard);
            self.instrumentation.event(Level::INFO, "bake.dropped", item, None);
            span.fail(&err);
            return Err(err);
        }

        if self.config.is_burnt(units) {
            drop(guard);
            self.instrumentation.event(Level::INFO, "bake.dropped", item, None);

            let burnt = BurntError::new(item.id.clone(), units, self.config.burnt_threshold);
            span.fail(&burnt);
            self.instrumentation.event(
                Level::ERROR,
                "bake.burnt",
                item,
                Some(json!({ "attempt": attempt, "duration": units })),
            );
            return Err(burnt.into());
        }

        guard.disarm();
        let baked = self.table.take(&item.id).map_err(|err| {
            span.fail(&err);
            err
        })?;
        self.instrumentation.event(Level::INFO, "bake.popped", &baked, None);
        Ok((baked, units))
    }

    pub(super) async fn pack(
        &self,
        item: &Item,
        attempt: u32,
        cancel: &CancellationToken,
    ) -> BakeryResult<u64> {
        let units = self.draw(StageName::Pack);
        let span = self.stage_span(StageName::Pack, item, attempt, units);
        self.instrumentation.event(
            Level::INFO,
            "pack.started",
            item,
            Some(json!({ "attempt": attempt, "duration": units })),
        );

        self.hold(units, item, cancel).await.map_err(|err| {
            span.fail(&err);
            err
        })?;
        Ok(units)
    }
}
