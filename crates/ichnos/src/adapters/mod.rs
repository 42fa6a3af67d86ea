//! Adapters wiring the tracing domain to threads and output destinations.

pub(crate) mod processor;
pub mod sink;

pub use sink::{CollectSink, JsonLinesSink, RecordSink, StdoutSink};
