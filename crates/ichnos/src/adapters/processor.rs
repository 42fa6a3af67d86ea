//! The record processor: single consumer thread draining the transport.
//!
//! The loop checks the shutdown flag, drains one record if available, and
//! otherwise sleeps for the configured poll interval. Span starts and ends
//! maintain the live-span table; events are resolved against it and emitted
//! to the sink. Records still queued when shutdown is observed are discarded.

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::adapters::sink::RecordSink;
use crate::domain::causality::{LiveSpan, LiveSpanTable};
use crate::domain::record::{FullRecord, RecordValue, ScopeEntry};
use crate::domain::tracelet::{RecordKind, Tracelet};
use crate::domain::types::{Attribute, AttributeValue};
use crate::tracer::TracerCore;

pub(crate) struct Processor<S: RecordSink> {
    core: Arc<TracerCore>,
    live: LiveSpanTable,
    sink: S,
    poll_interval: Duration,
}

impl<S: RecordSink> Processor<S> {
    pub(crate) fn new(core: Arc<TracerCore>, sink: S, poll_interval: Duration) -> Self {
        Self {
            core,
            live: LiveSpanTable::new(),
            sink,
            poll_interval,
        }
    }

    pub(crate) fn run(mut self) {
        info!("record processor started");
        loop {
            if self.core.shutdown.load(Ordering::Acquire) {
                break;
            }
            match self.core.queue.try_pop() {
                Some(record) => {
                    self.dispatch(record);
                    self.core.processed.fetch_add(1, Ordering::Relaxed);
                }
                None => thread::sleep(self.poll_interval),
            }
        }
        info!(
            processed = self.core.processed.load(Ordering::Relaxed),
            dropped = self.core.dropped.load(Ordering::Relaxed),
            live_spans = self.live.len(),
            "record processor stopped"
        );
    }

    fn dispatch(&mut self, record: Tracelet) {
        match record.kind {
            RecordKind::SpanStart => {
                self.live.insert(
                    record.span_id,
                    LiveSpan {
                        name_hash: record.name_hash,
                        parent_span_id: record.parent_span_id,
                        cause_id: record.cause_id,
                        attributes: record.attributes().to_vec(),
                    },
                );
            }
            RecordKind::SpanEnd => {
                // An orphan end (start dropped or never seen) is a no-op.
                self.live.remove(record.span_id);
            }
            RecordKind::Event => {
                let assembled = self.assemble(&record);
                self.sink.emit(assembled);
            }
        }
    }

    fn assemble(&self, record: &Tracelet) -> FullRecord {
        let cause = self
            .live
            .effective_cause(record.cause_id, record.parent_span_id);
        let scope = self
            .live
            .scope_chain(record.parent_span_id)
            .into_iter()
            .map(|(span_id, span)| ScopeEntry {
                span_id,
                name: self.core.strings.resolve(span.name_hash),
                data: self.resolve_attributes(&span.attributes),
            })
            .collect();

        FullRecord {
            name: self.core.strings.resolve(record.name_hash),
            kind: record.kind,
            trace_id: record.trace_id,
            span_id: record.span_id,
            parent_id: record.parent_span_id.is_valid().then_some(record.parent_span_id),
            cause,
            data: self.resolve_attributes(record.attributes()),
            scope,
        }
    }

    fn resolve_attributes(&self, attributes: &[Attribute]) -> BTreeMap<String, RecordValue> {
        attributes
            .iter()
            .map(|attribute| {
                let key = self.core.strings.resolve(attribute.key_hash);
                let value = match attribute.value {
                    AttributeValue::Bool(v) => RecordValue::Bool(v),
                    AttributeValue::I64(v) => RecordValue::I64(v),
                    AttributeValue::F64(v) => RecordValue::F64(v),
                    AttributeValue::StringId(id) => {
                        RecordValue::Str(self.core.strings.resolve(id))
                    }
                };
                (key, value)
            })
            .collect()
    }
}
