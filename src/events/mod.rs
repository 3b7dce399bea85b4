//! Status event types, the bounded progress channel, and sinks.

pub mod progress;
pub mod sink;

pub use progress::{ProgressEvent, ProgressReporter, StatusEvent};
pub use sink::{spawn_drain, MemorySink, ProgressSink, TracingSink};
