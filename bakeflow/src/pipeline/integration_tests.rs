//! End-to-end tests for the bakery pipeline.

#[cfg(test)]
mod tests {
    use crate::cancellation::CancellationToken;
    use crate::config::BakeryConfig;
    use crate::core::{Item, ItemId, ItemType, PipelineState, StageName};
    use crate::durations::{RandomDurationSource, ScriptedDurationSource};
    use crate::errors::BakeryError;
    use crate::events::LoggingEventSink;
    use crate::observability::{init_test_logging, Instrumentation, LoggingTracer};
    use crate::pipeline::{Bakery, RestartPolicy};
    use crate::testing::{assert_cancelled, assert_not_tracked, assert_same_item, TestBakery};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use tracing::Level;

    #[tokio::test(start_paused = true)]
    async fn scenario_a_single_clean_bake() {
        let f = TestBakery::with_bake([5]);
        let item = Item::with_id("x1", ItemType::Margherita);
        let start = tokio::time::Instant::now();

        let report = f
            .bakery
            .process_detailed(item.clone(), &CancellationToken::new())
            .await
            .unwrap();

        assert_same_item(&item, &report.item);
        assert_eq!(report.restarts, 0);
        assert_eq!(report.final_durations.bake, 5);
        assert_not_tracked(f.bakery.table(), &item.id);
        assert!(start.elapsed() >= TestBakery::units(1 + 5 + 1));

        assert_eq!(
            f.events.event_types(),
            vec![
                "process.started",
                "make.started",
                "bake.pushed",
                "bake.popped",
                "pack.started",
                "process.completed",
            ]
        );
        assert_eq!(
            f.tracer.started(),
            vec!["bakery.process", "bakery.make", "bakery.bake", "bakery.pack"]
        );
        assert!(f.tracer.failed_spans().is_empty());
        assert!(f.tracer.all_spans_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_b_burnt_then_clean() {
        let f = TestBakery::with_bake([8, 4]);
        let item = Item::with_id("x2", ItemType::Pepperoni);

        let report = f
            .bakery
            .process_detailed(item.clone(), &CancellationToken::new())
            .await
            .unwrap();

        assert_same_item(&item, &report.item);
        assert_eq!(report.restarts, 1);
        assert_eq!(report.attempts(), 2);
        assert_eq!(report.bake_durations, vec![8, 4]);
        assert_eq!(
            report.trail.states(),
            &[
                PipelineState::Making,
                PipelineState::Baking,
                PipelineState::Burnt,
                PipelineState::Making,
                PipelineState::Baking,
                PipelineState::Packing,
                PipelineState::Done,
            ]
        );

        assert_eq!(f.stage_runs(StageName::Make), 2);
        assert_eq!(f.stage_runs(StageName::Bake), 2);
        assert_eq!(f.stage_runs(StageName::Pack), 1);
        assert_eq!(f.tracer.started_count("bakery.pack"), 1);

        assert_eq!(f.tracer.failed_spans(), vec!["bakery.bake"]);
        assert_eq!(f.events.events_of_type("bake.burnt").len(), 1);
        assert_not_tracked(f.bakery.table(), &item.id);

        // One error per burn; the restart itself is a warning.
        let errors: Vec<String> = f
            .events
            .events_at(Level::ERROR)
            .into_iter()
            .map(|(_, t, _)| t)
            .collect();
        assert_eq!(errors, vec!["bake.burnt"]);
        let warnings: Vec<String> = f
            .events
            .events_at(Level::WARN)
            .into_iter()
            .map(|(_, t, _)| t)
            .collect();
        assert_eq!(warnings, vec!["process.burnt"]);

        let completed = f.events.events_of_type("process.completed");
        let data = completed[0].2.clone().unwrap();
        assert_eq!(data["restarts"], 1);
        assert_eq!(data["units"], 1 + 4 + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_c_cancel_mid_bake() {
        let f = TestBakery::with_bake([5]);
        let item = Item::with_id("x3", ItemType::Margherita);
        let cancel = CancellationToken::new();

        let observe_and_cancel = async {
            tokio::time::sleep(TestBakery::units(2)).await;
            let tracked_mid_bake = f.bakery.table().contains(&item.id);
            tokio::time::sleep(TestBakery::units(1)).await;
            cancel.cancel("client disconnected");
            tracked_mid_bake
        };

        let (tracked_mid_bake, result) =
            tokio::join!(observe_and_cancel, f.bakery.process(item.clone(), &cancel));

        assert!(tracked_mid_bake);
        assert_cancelled(&result);
        assert_not_tracked(f.bakery.table(), &item.id);
        assert_eq!(f.stage_runs(StageName::Pack), 0);
        assert!(f.events.events_of_type("pack.").is_empty());

        let failed = f.tracer.failed_spans();
        assert!(failed.contains(&"bakery.bake".to_string()));
        assert!(failed.contains(&"bakery.process".to_string()));
        assert!(f.tracer.errors().iter().any(|e| e.contains("client disconnected")));
        assert!(f.tracer.all_spans_closed());

        let errors = f.events.events_at(Level::ERROR);
        assert!(errors.iter().any(|(_, t, _)| t == "process.cancelled"));
    }

    #[tokio::test(start_paused = true)]
    async fn burnt_boundary() {
        for bake in 3..=7 {
            let f = TestBakery::with_bake([bake]);
            let report = f
                .bakery
                .process_detailed(Item::new(ItemType::Margherita), &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(report.restarts, 0, "bake={bake}");
        }

        for bake in 8..=12 {
            let f = TestBakery::with_bake([bake]);
            let report = f
                .bakery
                .process_detailed(Item::new(ItemType::Margherita), &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(report.restarts, 1, "bake={bake}");
            assert_eq!(f.stage_runs(StageName::Make), 2, "bake={bake}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_retry_converges() {
        const BURNT: usize = 25;
        let mut script = vec![8; BURNT];
        script.push(6);
        let f = TestBakery::with_bake(script);
        let item = Item::with_id("x4", ItemType::Pepperoni);

        let report = f
            .bakery
            .process_detailed(item.clone(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.restarts as usize, BURNT);
        assert_eq!(report.trail.count(PipelineState::Burnt), BURNT);
        assert_eq!(report.trail.count(PipelineState::Packing), 1);
        assert_eq!(f.stage_runs(StageName::Make), BURNT + 1);
        assert_eq!(f.stage_runs(StageName::Pack), 1);
        assert_same_item(&item, &report.item);
        assert!(f.bakery.table().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_make_never_bakes() {
        let f = TestBakery::scripted(
            ScriptedDurationSource::new().with(StageName::Make, [2]),
            RestartPolicy::default(),
        );
        let item = Item::with_id("x5", ItemType::Margherita);
        let cancel = CancellationToken::new();

        let canceller = async {
            tokio::time::sleep(TestBakery::units(1)).await;
            cancel.cancel("shutdown");
        };
        let ((), result) = tokio::join!(canceller, f.bakery.process(item.clone(), &cancel));

        assert_cancelled(&result);
        assert_eq!(f.stage_runs(StageName::Bake), 0);
        assert!(f.events.events_of_type("bake.").is_empty());
        assert_eq!(f.tracer.failed_spans(), vec!["bakery.make", "bakery.process"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_coinciding_with_burnt_bake_wins() {
        let f = TestBakery::with_bake([8, 3]);
        let item = Item::with_id("x6", ItemType::Margherita);
        let cancel = CancellationToken::new();

        let canceller = async {
            tokio::time::sleep(TestBakery::units(1 + 8)).await;
            cancel.cancel("closing time");
        };
        let ((), result) = tokio::join!(canceller, f.bakery.process(item.clone(), &cancel));

        assert_cancelled(&result);
        // The bake resolved as cancelled, so no burn and no second attempt.
        assert_eq!(f.stage_runs(StageName::Make), 1);
        assert!(f.events.events_of_type("bake.burnt").is_empty());
        assert!(f.events.events_of_type("process.burnt").is_empty());
        assert_eq!(f.tracer.started_count("bakery.make"), 1);
        assert_eq!(f.stage_runs(StageName::Pack), 0);
        assert_not_tracked(f.bakery.table(), &item.id);
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_token_returns_immediately() {
        let f = TestBakery::with_bake([5]);
        let cancel = CancellationToken::new();
        cancel.cancel("before start");

        let result = f.bakery.process(Item::new(ItemType::Pepperoni), &cancel).await;

        assert!(matches!(
            result,
            Err(BakeryError::Cancelled { ref reason, .. }) if reason == "before start"
        ));
        assert_eq!(f.stage_runs(StageName::Bake), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_backoff() {
        let f = TestBakery::scripted(
            ScriptedDurationSource::new().with_bake([8]),
            RestartPolicy::unbounded().with_backoff_ms(1_000),
        );
        let item = Item::with_id("x7", ItemType::Margherita);
        let cancel = CancellationToken::new();

        let canceller = async {
            tokio::time::sleep(TestBakery::units(1 + 8) + Duration::from_millis(500)).await;
            cancel.cancel("gave up waiting");
        };
        let ((), result) = tokio::join!(canceller, f.bakery.process(item.clone(), &cancel));

        assert_cancelled(&result);
        assert_eq!(f.stage_runs(StageName::Make), 1);
        assert_not_tracked(f.bakery.table(), &item.id);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_process_future_releases_entry() {
        let f = TestBakery::with_bake([5]);
        let item = Item::with_id("x8", ItemType::Margherita);
        let cancel = CancellationToken::new();

        let result = tokio::time::timeout(
            TestBakery::units(3),
            f.bakery.process(item.clone(), &cancel),
        )
        .await;

        assert!(result.is_err());
        assert_not_tracked(f.bakery.table(), &item.id);
        assert!(f.tracer.all_spans_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn same_id_twice_concurrently_keeps_one_entry() {
        let f = TestBakery::with_bake([5, 5]);
        let item = Item::with_id("dup", ItemType::Margherita);
        let cancel = CancellationToken::new();

        let (a, b) = tokio::join!(
            f.bakery.process(item.clone(), &cancel),
            f.bakery.process(item.clone(), &cancel),
        );

        let results = [a, b];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let dup = results
            .iter()
            .filter(|r| matches!(r, Err(BakeryError::AlreadyBaking { .. })))
            .count();
        assert_eq!((ok, dup), (1, 1));
        assert!(f.bakery.table().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_distinct_items() {
        let bakery = Bakery::new(BakeryConfig::default().with_time_unit(Duration::from_millis(1)))
            .unwrap()
            .with_durations(Arc::new(RandomDurationSource::seeded(2024)));
        let cancel = CancellationToken::new();
        let items: Vec<_> = (0..50)
            .map(|i| Item::with_id(format!("c{i}"), ItemType::ALL[i % 2]))
            .collect();

        let peak = Arc::new(parking_lot::Mutex::new(0usize));
        let monitor = {
            let table = bakery.table().clone();
            let peak = peak.clone();
            async move {
                for _ in 0..200 {
                    let ids = table.in_flight_ids();
                    let mut unique = ids.clone();
                    unique.dedup();
                    assert_eq!(ids.len(), unique.len());
                    let mut peak = peak.lock();
                    *peak = (*peak).max(ids.len());
                    drop(peak);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        };

        let runs = futures::future::join_all(items.iter().map(|item| bakery.process(item.clone(), &cancel)));
        let (results, ()) = tokio::join!(runs, monitor);

        for (item, result) in items.iter().zip(results) {
            assert_same_item(item, &result.unwrap());
        }
        assert!(bakery.table().is_empty());
        assert!(*peak.lock() > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_entry_fails_fast() {
        // An outside actor clearing the oven mid-bake.
        let f = TestBakery::with_bake([5]);
        let item = Item::with_id("x9", ItemType::Pepperoni);
        let table = f.bakery.table().clone();
        let id: ItemId = item.id.clone();
        let cancel = CancellationToken::new();

        let saboteur = async {
            tokio::time::sleep(TestBakery::units(3)).await;
            table.remove(&id);
        };
        let ((), result) = tokio::join!(saboteur, f.bakery.process(item, &cancel));

        assert!(matches!(result, Err(BakeryError::TrackingEntryMissing { .. })));
        assert_eq!(f.stage_runs(StageName::Pack), 0);
        assert_eq!(f.stage_runs(StageName::Make), 1);
        assert_eq!(f.events.events_of_type("process.failed").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn identity_preserved_across_random_runs() {
        for seed in 0..20 {
            let bakery = Bakery::new(
                BakeryConfig::default()
                    .with_time_unit(Duration::from_millis(1))
                    .with_seed(seed),
            )
            .unwrap();
            let item = Item::new(ItemType::ALL[usize::try_from(seed % 2).unwrap()]);

            let done = bakery.process(item.clone(), &CancellationToken::new()).await.unwrap();

            assert_same_item(&item, &done);
            assert_not_tracked(bakery.table(), &item.id);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn logging_instrumentation_end_to_end() {
        init_test_logging();
        let tracer = Arc::new(LoggingTracer::new());
        let bakery = Bakery::new(BakeryConfig::default().with_time_unit(Duration::from_millis(1)))
            .unwrap()
            .with_durations(Arc::new(ScriptedDurationSource::new().with_bake([9, 5])))
            .with_instrumentation(
                Instrumentation::noop()
                    .with_tracer(tracer.clone())
                    .with_events(Arc::new(LoggingEventSink::debug())),
            );
        let item = Item::with_id("log1", ItemType::Margherita);

        let done = bakery.process(item.clone(), &CancellationToken::new()).await.unwrap();

        assert_same_item(&item, &done);
        assert_eq!(tracer.open_spans(), 0);
    }
}
