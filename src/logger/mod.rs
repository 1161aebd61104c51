//! Logging: a small `Sink` trait the driver writes structured events
//! through, plus a console and a JSONL implementation. Single-threaded and
//! synchronous, in keeping with the rest of the core.

pub mod sink;

pub use sink::{ConsoleSink, JsonlSink, LogEvent, Severity, Sink};
#[cfg(test)]
pub use sink::RecordingSink;
