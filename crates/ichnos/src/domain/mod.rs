//! Pure tracing domain: identifiers, records, per-thread context and the
//! consumer-side causality logic. Nothing here performs I/O or owns threads.

pub mod causality;
pub mod context;
pub mod record;
pub mod tracelet;
pub mod types;

pub use causality::{CausalLink, LiveSpan, LiveSpanTable};
pub use context::SpanContext;
pub use record::{FullRecord, RecordValue, ScopeEntry};
pub use tracelet::{RecordKind, Tracelet};
pub use types::{
    collect_span_args, Attribute, AttributeValue, CausedBy, CollectedArgs, Id, IdAllocator,
    SpanArg, MAX_ATTRIBUTES,
};
