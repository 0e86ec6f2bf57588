//! Observability
//!
//! Diagnostic logging through `tracing`, plus an optional JSONL stream of
//! session events for tools that want to follow a practice run.

pub mod events;
pub mod logging;

pub use events::{Event, EventEmitter};
pub use logging::{LogFormat, init_logging};
