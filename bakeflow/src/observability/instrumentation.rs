//! Panic-isolated access to the tracer and event sink.

use super::tracer::{NoOpTracer, SpanAttributes, SpanId, Tracer};
use crate::core::Item;
use crate::events::{EventSink, NoOpEventSink};
use crate::utils::iso_timestamp;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{warn, Level};

/// Runs an instrumentation callback, swallowing panics.
fn guarded<T>(what: &str, f: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Instrumentation {} panicked: {:?}", what, e);
            None
        }
    }
}

/// The tracer and event sink a pipeline reports to.
///
/// Every call is best-effort: a panicking backend is logged and ignored, and
/// nothing here returns an error to the caller.
#[derive(Clone)]
pub struct Instrumentation {
    tracer: Arc<dyn Tracer>,
    events: Arc<dyn EventSink>,
}

impl Default for Instrumentation {
    fn default() -> Self {
        Self::noop()
    }
}

impl Instrumentation {
    /// Creates instrumentation from a tracer and an event sink.
    #[must_use]
    pub fn new(tracer: Arc<dyn Tracer>, events: Arc<dyn EventSink>) -> Self {
        Self { tracer, events }
    }

    /// Instrumentation that discards everything.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Arc::new(NoOpTracer), Arc::new(NoOpEventSink))
    }

    /// Replaces the tracer.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Opens a span that ends when the returned scope is dropped.
    #[must_use]
    pub fn span(&self, name: &str, attributes: &SpanAttributes) -> SpanScope {
        let id = guarded("start_span", || self.tracer.start_span(name, attributes))
            .unwrap_or(SpanId::NONE);
        SpanScope {
            tracer: self.tracer.clone(),
            id,
        }
    }

    /// Emits an event for `item`, merging `extra` fields into the payload.
    pub fn event(
        &self,
        level: Level,
        event_type: &str,
        item: &Item,
        extra: Option<serde_json::Value>,
    ) {
        let mut data = item.to_fields();
        if let Some(fields) = data.as_object_mut() {
            fields.insert("timestamp".into(), iso_timestamp().into());
            if let Some(serde_json::Value::Object(extra)) = extra {
                fields.extend(extra);
            }
        }
        guarded("emit", || self.events.try_emit(level, event_type, Some(data)));
    }
}

impl std::fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumentation").finish_non_exhaustive()
    }
}

/// Scoped handle for an open span.
pub struct SpanScope {
    tracer: Arc<dyn Tracer>,
    id: SpanId,
}

impl SpanScope {
    /// The span id.
    #[must_use]
    pub fn id(&self) -> SpanId {
        self.id
    }

    /// Attaches a fault to the span.
    pub fn record_error(&self, fault: &(dyn std::error::Error + 'static)) {
        guarded("record_error", || self.tracer.record_error(self.id, fault));
    }

    /// Marks the span as failed.
    pub fn set_error_status(&self, description: &str) {
        guarded("set_error_status", || {
            self.tracer.set_error_status(self.id, description);
        });
    }

    /// Records `fault` and marks the span failed with its message.
    pub fn fail(&self, fault: &(dyn std::error::Error + 'static)) {
        self.set_error_status(&fault.to_string());
        self.record_error(fault);
    }
}

impl Drop for SpanScope {
    fn drop(&mut self) {
        guarded("end_span", || self.tracer.end_span(self.id));
    }
}

impl std::fmt::Debug for SpanScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanScope").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ItemType;
    use crate::errors::BurntError;
    use crate::events::CollectingEventSink;
    use std::collections::HashMap;

    struct PanickingTracer;

    impl Tracer for PanickingTracer {
        fn start_span(&self, _name: &str, _attributes: &SpanAttributes) -> SpanId {
            panic!("exporter down");
        }
        fn record_error(&self, _span: SpanId, _fault: &(dyn std::error::Error + 'static)) {
            panic!("exporter down");
        }
        fn set_error_status(&self, _span: SpanId, _description: &str) {
            panic!("exporter down");
        }
        fn end_span(&self, _span: SpanId) {
            panic!("exporter down");
        }
    }

    #[test]
    fn test_panicking_tracer_is_contained() {
        let instrumentation = Instrumentation::noop().with_tracer(Arc::new(PanickingTracer));

        let scope = instrumentation.span("bakery.bake", &HashMap::new());
        assert_eq!(scope.id(), SpanId::NONE);
        scope.fail(&BurntError::new("p1".into(), 8, 8));
        drop(scope);
    }

    #[test]
    fn test_event_merges_item_fields() {
        let sink = Arc::new(CollectingEventSink::new());
        let instrumentation = Instrumentation::noop().with_events(sink.clone());
        let item = Item::with_id("p1", ItemType::Pepperoni);

        instrumentation.event(
            Level::INFO,
            "bake.pushed",
            &item,
            Some(serde_json::json!({"duration": 5})),
        );

        let events = sink.events();
        assert_eq!(events.len(), 1);
        let data = events[0].2.clone().unwrap();
        assert_eq!(data["item_id"], "p1");
        assert_eq!(data["item_type"], "pepperoni");
        assert_eq!(data["duration"], 5);
        assert!(data["timestamp"].as_str().is_some_and(|ts| ts.contains('T')));
    }
}
