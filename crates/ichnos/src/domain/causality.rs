//! Consumer-side live-span bookkeeping and causal-link resolution.
//!
//! The table is owned by the single consumer thread, so no synchronisation
//! is needed. Entries exist from the arrival of a span's start record until
//! its end record; the parent-chain walks below deliberately stop at the
//! first ancestor that is not (or no longer) in the table, which makes the
//! consumer robust against dropped records and cross-thread arrival skew.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{Attribute, Id};

/// What the consumer remembers about a span that has started but not ended.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSpan {
    /// Interned name id of the span.
    pub name_hash: u64,
    /// Enclosing span, or invalid for roots.
    pub parent_span_id: Id,
    /// Explicit causal link carried by the span, or invalid.
    pub cause_id: Id,
    /// The span's own attributes.
    pub attributes: Vec<Attribute>,
}

/// A resolved causal link together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalLink {
    /// The causing entity.
    pub id: Id,
    /// True when the link was inherited from an ancestor span rather than
    /// given explicitly.
    pub implicit: bool,
}

/// `span_id -> LiveSpan` table, consumer-local.
#[derive(Debug, Default)]
pub struct LiveSpanTable {
    spans: HashMap<Id, LiveSpan>,
}

impl LiveSpanTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a live entry for `span_id`, replacing any stale one.
    pub fn insert(&mut self, span_id: Id, span: LiveSpan) {
        self.spans.insert(span_id, span);
    }

    /// Closes the entry for `span_id`. Unknown ids are a no-op: an orphan
    /// end record (its start was dropped or never seen) is ignored.
    pub fn remove(&mut self, span_id: Id) -> Option<LiveSpan> {
        self.spans.remove(&span_id)
    }

    /// Looks up a live span.
    #[must_use]
    pub fn get(&self, span_id: Id) -> Option<&LiveSpan> {
        self.spans.get(&span_id)
    }

    /// Number of live spans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// True when no span is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Resolves the effective cause of a record.
    ///
    /// An explicit cause wins outright. Otherwise the parent chain is walked
    /// upward from `parent`; the first ancestor carrying its own cause
    /// supplies the link, marked implicit. The walk ends at the first
    /// ancestor absent from the table.
    #[must_use]
    pub fn effective_cause(&self, explicit: Id, parent: Id) -> Option<CausalLink> {
        if explicit.is_valid() {
            return Some(CausalLink { id: explicit, implicit: false });
        }
        let mut current = parent;
        while current.is_valid() {
            let span = self.spans.get(&current)?;
            if span.cause_id.is_valid() {
                return Some(CausalLink { id: span.cause_id, implicit: true });
            }
            current = span.parent_span_id;
        }
        None
    }

    /// The chain of live enclosing spans starting at `from`, innermost
    /// first. Stops at the first span missing from the table.
    #[must_use]
    pub fn scope_chain(&self, from: Id) -> Vec<(Id, &LiveSpan)> {
        let mut chain = Vec::new();
        let mut current = from;
        while current.is_valid() {
            match self.spans.get(&current) {
                Some(span) => {
                    chain.push((current, span));
                    current = span.parent_span_id;
                }
                None => break,
            }
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(parent: Id, cause: Id) -> LiveSpan {
        LiveSpan {
            name_hash: 0,
            parent_span_id: parent,
            cause_id: cause,
            attributes: Vec::new(),
        }
    }

    #[test]
    fn explicit_cause_wins() {
        let table = LiveSpanTable::new();
        let link = table.effective_cause(Id(42), Id::INVALID).unwrap();
        assert_eq!(link, CausalLink { id: Id(42), implicit: false });
    }

    #[test]
    fn implicit_cause_comes_from_nearest_caused_ancestor() {
        let mut table = LiveSpanTable::new();
        // grandparent carries the cause, parent does not.
        table.insert(Id(1), span(Id::INVALID, Id(99)));
        table.insert(Id(2), span(Id(1), Id::INVALID));
        table.insert(Id(3), span(Id(2), Id::INVALID));

        let link = table.effective_cause(Id::INVALID, Id(3)).unwrap();
        assert_eq!(link, CausalLink { id: Id(99), implicit: true });
    }

    #[test]
    fn nearest_cause_shadows_farther_ones() {
        let mut table = LiveSpanTable::new();
        table.insert(Id(1), span(Id::INVALID, Id(10)));
        table.insert(Id(2), span(Id(1), Id(20)));

        let link = table.effective_cause(Id::INVALID, Id(2)).unwrap();
        assert_eq!(link.id, Id(20));
        assert!(link.implicit);
    }

    #[test]
    fn walk_stops_at_absent_ancestor() {
        let mut table = LiveSpanTable::new();
        // Parent chain points at id 5, which already ended.
        table.insert(Id(2), span(Id(5), Id::INVALID));
        assert_eq!(table.effective_cause(Id::INVALID, Id(2)), None);
        assert_eq!(table.effective_cause(Id::INVALID, Id(5)), None);
    }

    #[test]
    fn no_cause_anywhere_yields_none() {
        let mut table = LiveSpanTable::new();
        table.insert(Id(1), span(Id::INVALID, Id::INVALID));
        table.insert(Id(2), span(Id(1), Id::INVALID));
        assert_eq!(table.effective_cause(Id::INVALID, Id(2)), None);
    }

    #[test]
    fn orphan_remove_is_a_no_op() {
        let mut table = LiveSpanTable::new();
        assert!(table.remove(Id(77)).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn scope_chain_is_innermost_first() {
        let mut table = LiveSpanTable::new();
        table.insert(Id(1), span(Id::INVALID, Id::INVALID));
        table.insert(Id(2), span(Id(1), Id::INVALID));
        table.insert(Id(3), span(Id(2), Id::INVALID));

        let chain = table.scope_chain(Id(3));
        let ids: Vec<Id> = chain.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![Id(3), Id(2), Id(1)]);
    }

    #[test]
    fn scope_chain_tolerates_missing_links() {
        let mut table = LiveSpanTable::new();
        table.insert(Id(3), span(Id(2), Id::INVALID));
        let chain = table.scope_chain(Id(3));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn span_lifecycle_insert_then_remove() {
        let mut table = LiveSpanTable::new();
        table.insert(Id(1), span(Id::INVALID, Id::INVALID));
        assert_eq!(table.len(), 1);
        assert!(table.get(Id(1)).is_some());
        assert!(table.remove(Id(1)).is_some());
        assert!(table.get(Id(1)).is_none());
    }
}
