//! # ichnos
//!
//! Low-overhead in-process tracing: spans, events and explicit causal links,
//! carried from many instrumented threads to one background processor over a
//! bounded lock-free ring buffer.
//!
//! # Architecture
//!
//! The crate is split into three layers:
//!
//! - **Domain**: pure types and logic. Identifiers, fixed-size trace
//!   records, the per-thread span context and the consumer-side live-span
//!   table with causal-link resolution.
//! - **Infrastructure**: the MPSC ring buffer, the FNV-1a string interner
//!   and the monotonic clock.
//! - **Adapters**: the record processor thread and the output sinks.
//!
//! # Design principles
//!
//! - **Producers never block.** Emitting a record is a stack construction,
//!   one atomic reservation and one publication store. When the transport is
//!   full the record is dropped (and counted), never the caller's time.
//! - **Publication is explicit.** Per-slot ready flags separate slot
//!   reservation from record publication, so the processor can never observe
//!   a half-written record.
//! - **Names are hashes.** Static names hash at compile time; the processor
//!   resolves hashes back to strings through the interner.
//! - **Causality is resolved late.** Producers only stamp ids; the processor
//!   walks its live-span table to attach implicit causes and scope chains.
//!
//! # Usage
//!
//! ```
//! use ichnos::{CollectSink, Tracer, TracerConfig};
//!
//! let sink = CollectSink::new();
//! let tracer = Tracer::with_config(TracerConfig::default(), sink.clone()).unwrap();
//!
//! let mut request = ichnos::span!(tracer, "request", "peer" => "10.0.0.1");
//! ichnos::event!(tracer, "cache_miss", "key" => "user:42");
//! request.end();
//!
//! // The processor drains asynchronously; wait for it before shutting down.
//! while tracer.stats().processed < 3 {
//!     std::thread::sleep(std::time::Duration::from_millis(1));
//! }
//! tracer.shutdown();
//!
//! let records = sink.records();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].name, "cache_miss");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod global;
pub mod infrastructure;
mod macros;
pub mod tracer;

pub use adapters::sink::{CollectSink, JsonLinesSink, RecordSink, StdoutSink};
pub use domain::causality::{CausalLink, LiveSpan, LiveSpanTable};
pub use domain::context::SpanContext;
pub use domain::record::{FullRecord, RecordValue, ScopeEntry};
pub use domain::tracelet::{RecordKind, Tracelet};
pub use domain::types::{
    collect_span_args, Attribute, AttributeValue, CausedBy, Id, IdAllocator, SpanArg,
    MAX_ATTRIBUTES,
};
pub use error::{TraceError, TraceResult};
pub use infrastructure::clock::monotonic_ns;
pub use infrastructure::interner::{fnv1a_hash, StaticName, StringInterner};
pub use infrastructure::ring::{next_power_of_two, MpscRingBuffer};
pub use tracer::{IntoAttributeValue, Span, Tracer, TracerConfig, TracerStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
