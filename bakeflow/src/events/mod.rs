//! Event sink system for observability.
//!
//! The pipeline reports stage boundaries through an [`EventSink`] handed to
//! it at construction; there is no process-wide sink.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};
