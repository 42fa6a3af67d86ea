//! Record sinks: where assembled records go.
//!
//! A sink runs on the processor thread and must never call back into the
//! producer API from there.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::domain::record::FullRecord;

/// Destination for assembled records.
pub trait RecordSink {
    /// Hands one assembled record to the sink.
    fn emit(&mut self, record: FullRecord);
}

/// Prints each record to standard output in a human-readable form.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl RecordSink for StdoutSink {
    fn emit(&mut self, record: FullRecord) {
        println!("{record}");
    }
}

/// Writes each record as one line of JSON.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwraps the writer, e.g. to inspect what was written.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: FullRecord) {
        match serde_json::to_writer(&mut self.writer, &record) {
            Ok(()) => {
                if let Err(err) = self.writer.write_all(b"\n") {
                    warn!(%err, "json sink write failed");
                }
            }
            Err(err) => warn!(%err, "json sink encode failed"),
        }
    }
}

/// Collects records into a shared vector. Intended for tests; clones share
/// the same storage.
#[derive(Debug, Clone, Default)]
pub struct CollectSink {
    records: Arc<Mutex<Vec<FullRecord>>>,
}

impl CollectSink {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything collected so far.
    #[must_use]
    pub fn records(&self) -> Vec<FullRecord> {
        self.records.lock().clone()
    }

    /// Number of collected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True when nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for CollectSink {
    fn emit(&mut self, record: FullRecord) {
        self.records.lock().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::RecordValue;
    use crate::domain::tracelet::RecordKind;
    use crate::domain::types::Id;
    use std::collections::BTreeMap;

    fn record(name: &str) -> FullRecord {
        let mut data = BTreeMap::new();
        data.insert("ok".to_owned(), RecordValue::Bool(true));
        FullRecord {
            name: name.to_owned(),
            kind: RecordKind::Event,
            trace_id: Id(1),
            span_id: Id(2),
            parent_id: None,
            cause: None,
            data,
            scope: Vec::new(),
        }
    }

    #[test]
    fn collect_sink_shares_storage_across_clones() {
        let sink = CollectSink::new();
        let mut writer = sink.clone();
        writer.emit(record("one"));
        writer.emit(record("two"));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records()[0].name, "one");
    }

    #[test]
    fn json_lines_sink_writes_one_line_per_record() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.emit(record("first"));
        sink.emit(record("second"));

        let buffer = sink.into_inner();
        let lines: Vec<&str> = std::str::from_utf8(&buffer)
            .unwrap()
            .lines()
            .collect();
        assert_eq!(lines.len(), 2);

        let decoded: FullRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(decoded.name, "first");
        assert_eq!(decoded.data["ok"], RecordValue::Bool(true));
    }
}
