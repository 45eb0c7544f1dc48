//! Observability utilities.
//!
//! The tracer boundary, the panic-isolating [`Instrumentation`] wrapper the
//! pipeline reports through, and log subscriber setup.

mod instrumentation;
mod logging;
mod tracer;

pub use instrumentation::{Instrumentation, SpanScope};
pub use logging::{init_logging, init_test_logging, LogProfile};
pub use tracer::{BakerySpanAttributes, LoggingTracer, NoOpTracer, SpanAttributes, SpanId, Tracer};
