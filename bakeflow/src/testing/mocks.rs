//! Recording test doubles for the instrumentation boundary.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::observability::{SpanAttributes, SpanId, Tracer};

/// One call made on a [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceRecord {
    /// A span was opened.
    Start {
        /// Span id.
        span: SpanId,
        /// Span name.
        name: String,
        /// Attributes passed at start.
        attributes: SpanAttributes,
    },
    /// A fault was attached.
    Error {
        /// Span id.
        span: SpanId,
        /// Rendered fault.
        message: String,
    },
    /// The span was marked failed.
    ErrorStatus {
        /// Span id.
        span: SpanId,
        /// Status description.
        description: String,
    },
    /// The span was closed.
    End {
        /// Span id.
        span: SpanId,
    },
}

/// A tracer that records every call for later inspection.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    next_id: AtomicU64,
    records: Mutex<Vec<TraceRecord>>,
}

impl RecordingTracer {
    /// Creates a new recording tracer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all records.
    #[must_use]
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().clone()
    }

    /// Names of started spans, in order.
    #[must_use]
    pub fn started(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                TraceRecord::Start { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// How many spans named `name` were started.
    #[must_use]
    pub fn started_count(&self, name: &str) -> usize {
        self.started().iter().filter(|n| *n == name).count()
    }

    /// Name of the span with `id`.
    #[must_use]
    pub fn name_of(&self, id: SpanId) -> Option<String> {
        self.records.lock().iter().find_map(|r| match r {
            TraceRecord::Start { span, name, .. } if *span == id => Some(name.clone()),
            _ => None,
        })
    }

    /// Names of spans that were marked failed, in order.
    #[must_use]
    pub fn failed_spans(&self) -> Vec<String> {
        let ids: Vec<SpanId> = self
            .records
            .lock()
            .iter()
            .filter_map(|r| match r {
                TraceRecord::ErrorStatus { span, .. } => Some(*span),
                _ => None,
            })
            .collect();
        ids.into_iter().filter_map(|id| self.name_of(id)).collect()
    }

    /// Messages of recorded faults.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                TraceRecord::Error { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns true if every started span has been ended exactly once.
    #[must_use]
    pub fn all_spans_closed(&self) -> bool {
        let records = self.records.lock();
        let starts = records
            .iter()
            .filter(|r| matches!(r, TraceRecord::Start { .. }))
            .count();
        let ends: std::collections::HashSet<SpanId> = records
            .iter()
            .filter_map(|r| match r {
                TraceRecord::End { span } => Some(*span),
                _ => None,
            })
            .collect();
        let end_calls = records
            .iter()
            .filter(|r| matches!(r, TraceRecord::End { .. }))
            .count();
        starts == ends.len() && ends.len() == end_calls
    }

    /// Clears all records.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Tracer for RecordingTracer {
    fn start_span(&self, name: &str, attributes: &SpanAttributes) -> SpanId {
        let span = SpanId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.records.lock().push(TraceRecord::Start {
            span,
            name: name.to_string(),
            attributes: attributes.clone(),
        });
        span
    }

    fn record_error(&self, span: SpanId, fault: &(dyn std::error::Error + 'static)) {
        self.records.lock().push(TraceRecord::Error {
            span,
            message: fault.to_string(),
        });
    }

    fn set_error_status(&self, span: SpanId, description: &str) {
        self.records.lock().push(TraceRecord::ErrorStatus {
            span,
            description: description.to_string(),
        });
    }

    fn end_span(&self, span: SpanId) {
        self.records.lock().push(TraceRecord::End { span });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_recording_tracer() {
        let tracer = RecordingTracer::new();
        let outer = tracer.start_span("bakery.process", &HashMap::new());
        let inner = tracer.start_span("bakery.bake", &HashMap::new());

        tracer.set_error_status(inner, "burnt");
        tracer.end_span(inner);
        assert!(!tracer.all_spans_closed());

        tracer.end_span(outer);
        assert!(tracer.all_spans_closed());

        assert_eq!(tracer.started(), vec!["bakery.process", "bakery.bake"]);
        assert_eq!(tracer.started_count("bakery.bake"), 1);
        assert_eq!(tracer.failed_spans(), vec!["bakery.bake"]);
        assert_eq!(tracer.name_of(outer).as_deref(), Some("bakery.process"));

        tracer.clear();
        assert!(tracer.records().is_empty());
    }
}
