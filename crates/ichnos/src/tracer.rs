//! Producer-facing tracing API.
//!
//! A [`Tracer`] owns the record transport, the string interner, the id
//! allocator and the background record processor. Producer operations are
//! non-blocking by contract: when the transport is full the record is dropped
//! (and counted), never the caller's time.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;

use crate::adapters::processor::Processor;
use crate::adapters::sink::RecordSink;
use crate::domain::context::{self, SpanContext};
use crate::domain::tracelet::{RecordKind, Tracelet};
use crate::domain::types::{collect_span_args, Attribute, AttributeValue, Id, IdAllocator, SpanArg};
use crate::error::TraceResult;
use crate::infrastructure::clock::monotonic_ns;
use crate::infrastructure::interner::{StaticName, StringInterner};
use crate::infrastructure::ring::MpscRingBuffer;

/// Tracer construction parameters.
#[derive(Debug, Clone, Copy)]
pub struct TracerConfig {
    /// Requested transport capacity; rounded up to a power of two.
    pub queue_capacity: usize,
    /// How long the processor sleeps when the transport is empty.
    pub poll_interval: Duration,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 8192,
            poll_interval: Duration::from_millis(1),
        }
    }
}

/// Producer/consumer counters, all maintained with relaxed atomics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TracerStats {
    /// Records the processor has drained from the transport.
    pub processed: u64,
    /// Records lost because the transport was full.
    pub dropped: u64,
}

/// State shared between producer threads and the processor thread.
pub(crate) struct TracerCore {
    pub(crate) queue: MpscRingBuffer<Tracelet>,
    pub(crate) strings: StringInterner,
    pub(crate) ids: IdAllocator,
    pub(crate) shutdown: AtomicBool,
    pub(crate) processed: AtomicU64,
    pub(crate) dropped: AtomicU64,
}

impl TracerCore {
    #[inline]
    fn emit(&self, record: Tracelet) {
        if self.queue.try_push(record).is_err() {
            // Deliberately lossy: never stall the instrumented program.
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// The tracer front end.
///
/// Cheap to share across threads by reference; all producer operations take
/// `&self`. Dropping the tracer (or calling [`Tracer::shutdown`]) stops and
/// joins the processor thread.
pub struct Tracer {
    core: Arc<TracerCore>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Tracer {
    /// Creates a tracer with the default configuration (capacity 8192,
    /// 1 ms poll) and the given sink.
    pub fn new<S>(sink: S) -> TraceResult<Self>
    where
        S: RecordSink + Send + 'static,
    {
        Self::with_config(TracerConfig::default(), sink)
    }

    /// Creates a tracer and starts its record processor thread.
    pub fn with_config<S>(config: TracerConfig, sink: S) -> TraceResult<Self>
    where
        S: RecordSink + Send + 'static,
    {
        let core = Arc::new(TracerCore {
            queue: MpscRingBuffer::with_capacity(config.queue_capacity)?,
            strings: StringInterner::new(),
            ids: IdAllocator::new(),
            shutdown: AtomicBool::new(false),
            processed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        });

        let processor = Processor::new(Arc::clone(&core), sink, config.poll_interval);
        let worker = thread::Builder::new()
            .name("ichnos-processor".to_owned())
            .spawn(move || processor.run())
            .map_err(crate::error::TraceError::WorkerSpawn)?;

        info!(capacity = core.queue.capacity(), "tracer started");
        Ok(Self {
            core,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Begins a span named by a compile-time-hashed literal. The parent is
    /// the calling thread's current span; the new span becomes current until
    /// it ends.
    pub fn begin_span(&self, name: &StaticName, args: &[SpanArg]) -> Span {
        let name_hash = self.core.strings.intern_static(name);
        self.begin_span_inner(name_hash, context::current(), args)
    }

    /// Begins a span under an explicit parent context instead of the
    /// thread's current span. An empty context starts a new root trace.
    pub fn begin_span_with(
        &self,
        name: &StaticName,
        parent: SpanContext,
        args: &[SpanArg],
    ) -> Span {
        let name_hash = self.core.strings.intern_static(name);
        self.begin_span_inner(name_hash, parent, args)
    }

    /// Begins a span with a runtime-interned name.
    pub fn begin_span_dyn(&self, name: &str, args: &[SpanArg]) -> Span {
        let name_hash = self.core.strings.intern(name);
        self.begin_span_inner(name_hash, context::current(), args)
    }

    fn begin_span_inner(&self, name_hash: u64, parent: SpanContext, args: &[SpanArg]) -> Span {
        let span_id = self.core.ids.allocate();
        // A root span opens its own trace; a child inherits the parent's
        // trace id, which the context carries alongside the span id.
        let trace_id = if parent.span_id.is_valid() {
            parent.trace_id
        } else {
            span_id
        };
        let collected = collect_span_args(args);

        if !self.core.shutdown.load(Ordering::Relaxed) {
            self.core.emit(Tracelet::with_attributes(
                monotonic_ns(),
                trace_id,
                span_id,
                parent.span_id,
                collected.cause,
                name_hash,
                RecordKind::SpanStart,
                collected.attributes(),
            ));
        }

        let ctx = SpanContext { trace_id, span_id };
        let prev = context::set_current(ctx);
        Span {
            core: Some(Arc::clone(&self.core)),
            ctx,
            prev,
        }
    }

    /// Emits a point-in-time event attached to the calling thread's current
    /// span. Events carry their own fresh id and leave the thread context
    /// untouched.
    pub fn create_event(&self, name: &StaticName, args: &[SpanArg]) {
        let name_hash = self.core.strings.intern_static(name);
        self.create_event_inner(name_hash, context::current(), args);
    }

    /// Emits an event under an explicit parent context.
    pub fn create_event_with(&self, name: &StaticName, parent: SpanContext, args: &[SpanArg]) {
        let name_hash = self.core.strings.intern_static(name);
        self.create_event_inner(name_hash, parent, args);
    }

    /// Emits an event with a runtime-interned name.
    pub fn create_event_dyn(&self, name: &str, args: &[SpanArg]) {
        let name_hash = self.core.strings.intern(name);
        self.create_event_inner(name_hash, context::current(), args);
    }

    fn create_event_inner(&self, name_hash: u64, parent: SpanContext, args: &[SpanArg]) {
        let event_id = self.core.ids.allocate();
        let trace_id = if parent.span_id.is_valid() {
            parent.trace_id
        } else {
            Id::INVALID
        };
        let collected = collect_span_args(args);

        if !self.core.shutdown.load(Ordering::Relaxed) {
            self.core.emit(Tracelet::with_attributes(
                monotonic_ns(),
                trace_id,
                event_id,
                parent.span_id,
                collected.cause,
                name_hash,
                RecordKind::Event,
                collected.attributes(),
            ));
        }
    }

    /// Builds an attribute, interning the key (and a string value, if any).
    pub fn attr<V>(&self, key: &str, value: V) -> Attribute
    where
        V: IntoAttributeValue,
    {
        Attribute::new(self.core.strings.intern(key), value.into_attribute_value(self))
    }

    /// Interns an arbitrary string, returning its stable id.
    pub fn intern(&self, text: &str) -> u64 {
        self.core.strings.intern(text)
    }

    /// Current counter snapshot.
    pub fn stats(&self) -> TracerStats {
        TracerStats {
            processed: self.core.processed.load(Ordering::Relaxed),
            dropped: self.core.dropped.load(Ordering::Relaxed),
        }
    }

    /// Signals the processor to stop and joins it. Idempotent. Records still
    /// in the transport when the flag is observed are discarded.
    pub fn shutdown(&self) {
        self.core.shutdown.store(true, Ordering::Release);
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Tracer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// RAII handle for an open span.
///
/// Ending the span (explicitly or by drop) emits the end record and restores
/// the thread's previous span context. A second end is a no-op.
pub struct Span {
    core: Option<Arc<TracerCore>>,
    ctx: SpanContext,
    prev: SpanContext,
}

impl Span {
    /// The span's `(trace, span)` context, e.g. for explicit parenting on
    /// another thread.
    #[inline]
    #[must_use]
    pub fn context(&self) -> SpanContext {
        self.ctx
    }

    /// The span's own id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Id {
        self.ctx.span_id
    }

    /// Ends the span. Idempotent.
    pub fn end(&mut self) {
        let Some(core) = self.core.take() else {
            return;
        };
        if !core.shutdown.load(Ordering::Relaxed) {
            core.emit(Tracelet::control(
                monotonic_ns(),
                self.ctx.trace_id,
                self.ctx.span_id,
                RecordKind::SpanEnd,
            ));
        }
        context::set_current(self.prev);
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        self.end();
    }
}

/// Conversion into a typed attribute value.
///
/// String values intern through the tracer; everything else is a plain
/// wrap. Implemented for `bool`, the common integer widths, `f64` and
/// string types; other types are rejected at compile time.
pub trait IntoAttributeValue {
    /// Converts `self`, interning through `tracer` where needed.
    fn into_attribute_value(self, tracer: &Tracer) -> AttributeValue;
}

impl IntoAttributeValue for bool {
    fn into_attribute_value(self, _tracer: &Tracer) -> AttributeValue {
        AttributeValue::Bool(self)
    }
}

impl IntoAttributeValue for i32 {
    fn into_attribute_value(self, _tracer: &Tracer) -> AttributeValue {
        AttributeValue::I64(i64::from(self))
    }
}

impl IntoAttributeValue for i64 {
    fn into_attribute_value(self, _tracer: &Tracer) -> AttributeValue {
        AttributeValue::I64(self)
    }
}

impl IntoAttributeValue for u32 {
    fn into_attribute_value(self, _tracer: &Tracer) -> AttributeValue {
        AttributeValue::I64(i64::from(self))
    }
}

impl IntoAttributeValue for f64 {
    fn into_attribute_value(self, _tracer: &Tracer) -> AttributeValue {
        AttributeValue::F64(self)
    }
}

impl IntoAttributeValue for &str {
    fn into_attribute_value(self, tracer: &Tracer) -> AttributeValue {
        AttributeValue::StringId(tracer.intern(self))
    }
}

impl IntoAttributeValue for String {
    fn into_attribute_value(self, tracer: &Tracer) -> AttributeValue {
        AttributeValue::StringId(tracer.intern(&self))
    }
}

impl IntoAttributeValue for AttributeValue {
    fn into_attribute_value(self, _tracer: &Tracer) -> AttributeValue {
        self
    }
}
