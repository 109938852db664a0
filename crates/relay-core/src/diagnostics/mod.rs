//! Debug observability for fired events.
//!
//! When a registry runs in debug mode every fired event is handed to a
//! [`DiagnosticSink`] after dispatch.

mod sink;

pub use sink::{DiagnosticRecord, DiagnosticSink, MemorySink, TracingSink};
