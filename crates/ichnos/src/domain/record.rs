//! The consumer's assembled, string-resolved output form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::causality::CausalLink;
use super::tracelet::RecordKind;
use super::types::Id;

/// A fully-resolved attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed 64-bit integer.
    I64(i64),
    /// IEEE-754 double.
    F64(f64),
    /// Resolved string.
    Str(String),
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Bool(v) => write!(f, "{v}"),
            RecordValue::I64(v) => write!(f, "{v}"),
            RecordValue::F64(v) => write!(f, "{v}"),
            RecordValue::Str(v) => write!(f, "'{v}'"),
        }
    }
}

/// One enclosing span in an event's scope chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeEntry {
    /// The enclosing span's id.
    pub span_id: Id,
    /// Its resolved name.
    pub name: String,
    /// Its resolved attributes.
    pub data: BTreeMap<String, RecordValue>,
}

/// A resolved trace record ready for a sink: every hash replaced by its
/// string, the causal link resolved, and the chain of live enclosing spans
/// attached (innermost first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullRecord {
    /// Resolved record name.
    pub name: String,
    /// Record discriminant.
    pub kind: RecordKind,
    /// Trace the record belongs to.
    pub trace_id: Id,
    /// The record's own id.
    pub span_id: Id,
    /// Enclosing span, if any.
    pub parent_id: Option<Id>,
    /// Effective causal link with provenance, if any.
    pub cause: Option<CausalLink>,
    /// Resolved attributes.
    pub data: BTreeMap<String, RecordValue>,
    /// Live enclosing spans, innermost first.
    pub scope: Vec<ScopeEntry>,
}

impl fmt::Display for FullRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} '{}' trace={} id={}",
            self.kind, self.name, self.trace_id, self.span_id
        )?;
        if let Some(cause) = &self.cause {
            let provenance = if cause.implicit { "implicit" } else { "explicit" };
            write!(f, " cause={} ({provenance})", cause.id)?;
        }
        if !self.data.is_empty() {
            write!(f, " {{")?;
            for (i, (key, value)) in self.data.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}: {value}")?;
            }
            write!(f, "}}")?;
        }
        for entry in &self.scope {
            write!(f, "\n  in '{}'", entry.name)?;
            if !entry.data.is_empty() {
                write!(f, " {{")?;
                for (i, (key, value)) in entry.data.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")?;
            }
        }
        Ok(())
    }
}
