//! Tracer boundary and span attributes.
//!
//! The pipeline talks to tracing backends only through the [`Tracer`] trait,
//! so it can run against a no-op tracer in tests and a real exporter in
//! production without any change to control flow.

use crate::core::{Item, StageName};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Flat string attributes attached to a span.
pub type SpanAttributes = HashMap<String, String>;

/// Identifier of a span opened by a [`Tracer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(u64);

impl SpanId {
    /// Placeholder returned by tracers that do not track spans.
    pub const NONE: Self = Self(0);

    /// Wraps a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Trait for tracing backends.
pub trait Tracer: Send + Sync {
    /// Opens a span and returns its id.
    fn start_span(&self, name: &str, attributes: &SpanAttributes) -> SpanId;

    /// Attaches a fault to a span.
    fn record_error(&self, span: SpanId, fault: &(dyn std::error::Error + 'static));

    /// Marks a span as failed.
    fn set_error_status(&self, span: SpanId, description: &str);

    /// Closes a span.
    fn end_span(&self, span: SpanId);
}

/// No-op tracer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTracer;

impl Tracer for NoOpTracer {
    fn start_span(&self, _name: &str, _attributes: &SpanAttributes) -> SpanId {
        SpanId::NONE
    }
    fn record_error(&self, _span: SpanId, _fault: &(dyn std::error::Error + 'static)) {}
    fn set_error_status(&self, _span: SpanId, _description: &str) {}
    fn end_span(&self, _span: SpanId) {}
}

struct OpenSpan {
    name: String,
    started: Instant,
    failed: bool,
}

/// Tracer that reports span lifecycles as `tracing` events.
#[derive(Default)]
pub struct LoggingTracer {
    next_id: AtomicU64,
    open: Mutex<HashMap<SpanId, OpenSpan>>,
}

impl LoggingTracer {
    /// Creates a new logging tracer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of spans started and not yet ended.
    #[must_use]
    pub fn open_spans(&self) -> usize {
        self.open.lock().len()
    }

    fn span_name(&self, span: SpanId) -> String {
        self.open
            .lock()
            .get(&span)
            .map_or_else(|| "<unknown>".to_string(), |s| s.name.clone())
    }
}

impl Tracer for LoggingTracer {
    fn start_span(&self, name: &str, attributes: &SpanAttributes) -> SpanId {
        let id = SpanId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.open.lock().insert(
            id,
            OpenSpan {
                name: name.to_string(),
                started: Instant::now(),
                failed: false,
            },
        );
        tracing::debug!(span_name = name, span_id = id.0, ?attributes, "Span started");
        id
    }

    fn record_error(&self, span: SpanId, fault: &(dyn std::error::Error + 'static)) {
        tracing::error!(
            span_name = %self.span_name(span),
            span_id = span.0,
            error = %fault,
            "Span error"
        );
    }

    fn set_error_status(&self, span: SpanId, description: &str) {
        if let Some(open) = self.open.lock().get_mut(&span) {
            open.failed = true;
        }
        tracing::warn!(
            span_name = %self.span_name(span),
            span_id = span.0,
            status = "error",
            description,
            "Span status set"
        );
    }

    fn end_span(&self, span: SpanId) {
        let Some(open) = self.open.lock().remove(&span) else {
            return;
        };
        let duration_ms = open.started.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(
            span_name = %open.name,
            span_id = span.0,
            duration_ms,
            failed = open.failed,
            "Span ended"
        );
    }
}

impl std::fmt::Debug for LoggingTracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingTracer")
            .field("open_spans", &self.open_spans())
            .finish()
    }
}

/// Span attributes for bakery spans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BakerySpanAttributes {
    /// Item id.
    pub item_id: Option<String>,
    /// Item type.
    pub item_type: Option<String>,
    /// Stage name, unset for the pipeline span.
    pub stage: Option<String>,
    /// Attempt number, starting at 1.
    pub attempt: Option<u32>,
    /// Drawn duration in time units.
    pub duration_units: Option<u64>,
}

impl BakerySpanAttributes {
    /// Creates attributes for an item.
    #[must_use]
    pub fn for_item(item: &Item) -> Self {
        Self {
            item_id: Some(item.id.to_string()),
            item_type: Some(item.item_type.to_string()),
            ..Default::default()
        }
    }

    /// Sets the stage.
    #[must_use]
    pub fn with_stage(mut self, stage: StageName) -> Self {
        self.stage = Some(stage.to_string());
        self
    }

    /// Sets the attempt number.
    #[must_use]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Sets the drawn duration.
    #[must_use]
    pub fn with_duration_units(mut self, units: u64) -> Self {
        self.duration_units = Some(units);
        self
    }

    /// Converts to OpenTelemetry-style attributes.
    #[must_use]
    pub fn to_otel_attributes(&self) -> SpanAttributes {
        let mut attrs = HashMap::new();

        if let Some(ref v) = self.item_id {
            attrs.insert("item.id".to_string(), v.clone());
        }
        if let Some(ref v) = self.item_type {
            attrs.insert("item.type".to_string(), v.clone());
        }
        if let Some(ref v) = self.stage {
            attrs.insert("stage.name".to_string(), v.clone());
        }
        if let Some(v) = self.attempt {
            attrs.insert("pipeline.attempt".to_string(), v.to_string());
        }
        if let Some(v) = self.duration_units {
            attrs.insert("stage.duration_units".to_string(), v.to_string());
        }

        attrs
    }
}
