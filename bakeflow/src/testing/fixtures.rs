//! Test fixtures for pipeline testing.

use std::sync::Arc;
use std::time::Duration;

use super::mocks::RecordingTracer;
use crate::config::BakeryConfig;
use crate::core::StageName;
use crate::durations::ScriptedDurationSource;
use crate::events::CollectingEventSink;
use crate::observability::Instrumentation;
use crate::pipeline::{Bakery, RestartPolicy};

/// A bakery wired to recording collaborators.
///
/// Uses a 10ms time unit and a scripted duration source, so stage timings
/// are exact under a paused tokio clock.
pub struct TestBakery {
    /// The bakery under test.
    pub bakery: Bakery,
    /// The scripted durations it draws from.
    pub durations: Arc<ScriptedDurationSource>,
    /// Every tracer call.
    pub tracer: Arc<RecordingTracer>,
    /// Every logged event.
    pub events: Arc<CollectingEventSink>,
}

impl TestBakery {
    /// Time unit used by test bakeries.
    pub const TIME_UNIT: Duration = Duration::from_millis(10);

    /// Creates a test bakery that replays `bake` durations.
    #[must_use]
    pub fn with_bake(bake: impl IntoIterator<Item = u64>) -> Self {
        Self::scripted(ScriptedDurationSource::new().with_bake(bake), RestartPolicy::default())
    }

    /// Creates a test bakery from a full script and restart policy.
    #[must_use]
    pub fn scripted(durations: ScriptedDurationSource, restart: RestartPolicy) -> Self {
        let config = BakeryConfig::default()
            .with_time_unit(Self::TIME_UNIT)
            .with_restart(restart);
        let durations = Arc::new(durations);
        let tracer = Arc::new(RecordingTracer::new());
        let events = Arc::new(CollectingEventSink::new());

        let bakery = Bakery::new(config)
            .expect("default test config is valid")
            .with_durations(durations.clone())
            .with_instrumentation(Instrumentation::new(tracer.clone(), events.clone()));

        Self {
            bakery,
            durations,
            tracer,
            events,
        }
    }

    /// Wall-clock length of `units` time units.
    #[must_use]
    pub fn units(units: u64) -> Duration {
        Self::TIME_UNIT * u32::try_from(units).unwrap_or(u32::MAX)
    }

    /// Number of times `stage` ran (drew a duration).
    #[must_use]
    pub fn stage_runs(&self, stage: StageName) -> usize {
        self.durations.draws(stage)
    }
}
