//! Event sink trait and implementations.

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, error, info, trace, warn, Level};

/// A recorded event: level, type and optional payload.
pub type RecordedEvent = (Level, String, Option<serde_json::Value>);

/// Trait for leveled, structured event logging.
///
/// The pipeline emits one event per stage boundary, carrying the item id and
/// type in `data`.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    ///
    /// # Arguments
    ///
    /// * `level` - Severity of the event
    /// * `event_type` - The type of event (e.g., "bake.pushed")
    /// * `data` - Optional event data
    async fn emit(&self, level: Level, event_type: &str, data: Option<serde_json::Value>);

    /// Tries to emit an event without blocking.
    ///
    /// This method should never fail. Errors are logged but suppressed.
    fn try_emit(&self, level: Level, event_type: &str, data: Option<serde_json::Value>);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _level: Level, _event_type: &str, _data: Option<serde_json::Value>) {}

    fn try_emit(&self, _level: Level, _event_type: &str, _data: Option<serde_json::Value>) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    /// Events less severe than this are dropped.
    min_level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self {
            min_level: Level::INFO,
        }
    }
}

impl LoggingEventSink {
    /// Creates a logging sink that drops events below `min_level`.
    #[must_use]
    pub fn new(min_level: Level) -> Self {
        Self { min_level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates a warn-level logging sink.
    #[must_use]
    pub fn warn() -> Self {
        Self::new(Level::WARN)
    }

    /// Returns true if events at `level` pass this sink's filter.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        // tracing orders levels by verbosity: ERROR < WARN < ... < TRACE
        level <= self.min_level
    }

    fn log_event(&self, level: Level, event_type: &str, data: Option<&serde_json::Value>) {
        if !self.enabled(level) {
            return;
        }
        let item_id = data.and_then(|d| d.get("item_id")).and_then(|v| v.as_str());
        let item_type = data.and_then(|d| d.get("item_type")).and_then(|v| v.as_str());

        match level {
            Level::ERROR => error!(event_type, item_id, item_type, event_data = ?data, "{event_type}"),
            Level::WARN => warn!(event_type, item_id, item_type, event_data = ?data, "{event_type}"),
            Level::INFO => info!(event_type, item_id, item_type, event_data = ?data, "{event_type}"),
            Level::DEBUG => debug!(event_type, item_id, item_type, event_data = ?data, "{event_type}"),
            _ => trace!(event_type, item_id, item_type, event_data = ?data, "{event_type}"),
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, level: Level, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(level, event_type, data.as_ref());
    }

    fn try_emit(&self, level: Level, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(level, event_type, data.as_ref());
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.read().clone()
    }

    /// Returns the collected event types, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|(_, t, _)| t.clone()).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<RecordedEvent> {
        self.events
            .read()
            .iter()
            .filter(|(_, t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }

    /// Returns events logged at exactly `level`.
    #[must_use]
    pub fn events_at(&self, level: Level) -> Vec<RecordedEvent> {
        self.events
            .read()
            .iter()
            .filter(|(l, _, _)| *l == level)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, level: Level, event_type: &str, data: Option<serde_json::Value>) {
        self.try_emit(level, event_type, data);
    }

    fn try_emit(&self, level: Level, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((level, event_type.to_string(), data));
    }
}
