//! The fixed-size trace record carried on the lock-free transport.
//!
//! # Memory Layout
//! A `Tracelet` is cache-line aligned and its size is a whole multiple of the
//! cache line, so slot boundaries in the ring buffer never straddle lines:
//!
//! ```text
//! Tracelet (repr C, align 64)
//! ├─ timestamp        u64
//! ├─ trace_id         Id
//! ├─ span_id          Id
//! ├─ parent_span_id   Id
//! ├─ cause_id         Id
//! ├─ name_hash        u64
//! ├─ kind             RecordKind (u8)
//! ├─ attribute_count  u8
//! ├─ _pad             [u8; 6]
//! └─ attributes       [Attribute; MAX_ATTRIBUTES]
//! ```
//!
//! Both constructors zero the padding and every unused attribute slot, so a
//! record is bit-for-bit deterministic regardless of how it was built.

use serde::{Deserialize, Serialize};

use super::types::{Attribute, Id, MAX_ATTRIBUTES};

/// What a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RecordKind {
    /// A span began; the consumer opens a live-span entry.
    SpanStart,
    /// A span ended; the consumer closes the entry.
    SpanEnd,
    /// A point-in-time observation attached to its parent span.
    Event,
}

/// One trace record. Built on the producer's stack, moved into a ring slot,
/// and immutable from publication until the consumer pops it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C, align(64))]
pub struct Tracelet {
    /// Monotonic nanoseconds at emission.
    pub timestamp: u64,
    /// Trace the record belongs to. Root spans use their own span id.
    pub trace_id: Id,
    /// The span (or event) this record is about.
    pub span_id: Id,
    /// Enclosing span, or invalid for roots.
    pub parent_span_id: Id,
    /// Explicit causal link, or invalid.
    pub cause_id: Id,
    /// Interned name id; 0 for records without a name.
    pub name_hash: u64,
    /// Record discriminant.
    pub kind: RecordKind,
    /// Live entries in `attributes`.
    pub attribute_count: u8,
    _pad: [u8; 6],
    /// Inline attribute storage; slots past `attribute_count` are
    /// default-initialized.
    pub attributes: [Attribute; MAX_ATTRIBUTES],
}

impl Tracelet {
    /// Builds a record carrying attributes (span starts and events).
    /// Attributes past [`MAX_ATTRIBUTES`] are truncated.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn with_attributes(
        timestamp: u64,
        trace_id: Id,
        span_id: Id,
        parent_span_id: Id,
        cause_id: Id,
        name_hash: u64,
        kind: RecordKind,
        attrs: &[Attribute],
    ) -> Self {
        let mut attributes = [Attribute::default(); MAX_ATTRIBUTES];
        let count = attrs.len().min(MAX_ATTRIBUTES);
        attributes[..count].copy_from_slice(&attrs[..count]);
        Self {
            timestamp,
            trace_id,
            span_id,
            parent_span_id,
            cause_id,
            name_hash,
            kind,
            attribute_count: count as u8,
            _pad: [0; 6],
            attributes,
        }
    }

    /// Builds an attribute-free control record (span ends). Name, parent and
    /// cause are zeroed.
    #[must_use]
    pub fn control(timestamp: u64, trace_id: Id, span_id: Id, kind: RecordKind) -> Self {
        Self::with_attributes(
            timestamp,
            trace_id,
            span_id,
            Id::INVALID,
            Id::INVALID,
            0,
            kind,
            &[],
        )
    }

    /// The live prefix of the inline attribute array.
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes[..self.attribute_count as usize]
    }
}

impl Default for Tracelet {
    fn default() -> Self {
        Self::control(0, Id::INVALID, Id::INVALID, RecordKind::Event)
    }
}
