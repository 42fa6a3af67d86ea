//! Core identifier and attribute types shared by producers and the consumer.
//!
//! # Memory Layout
//! Everything here is `Copy` and heap-free; these values travel inline inside
//! fixed-size records on the lock-free transport.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Maximum number of inline attributes a single record can carry.
/// Attributes beyond this are silently dropped by the producer.
pub const MAX_ATTRIBUTES: usize = 6;

/// A unified, strongly-typed identifier for all trace entities.
///
/// Ids are opaque: equality is the only meaningful operation. `Id(0)` is
/// reserved as the invalid id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct Id(pub u64);

impl Id {
    /// The reserved "no entity" id.
    pub const INVALID: Id = Id(0);

    /// True for any id other than [`Id::INVALID`].
    #[inline(always)]
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic allocator of unique span/event ids.
///
/// A single relaxed `fetch_add`; ids start at 1 so that 0 stays invalid.
/// Overflow is unreachable at any realistic in-process rate.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Creates an allocator whose first id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    /// Yields the next id. Strictly increasing per allocator.
    #[inline]
    pub fn allocate(&self) -> Id {
        Id(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A tag establishing an explicit causal link to a previously-started
/// entity, orthogonal to parent nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CausedBy(pub Id);

/// One typed attribute value.
///
/// The string variant carries an interner id, not the string itself, so the
/// producer path stays allocation-free.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed 64-bit integer.
    I64(i64),
    /// IEEE-754 double.
    F64(f64),
    /// Interned string reference, resolvable through the interner.
    StringId(u64),
}

impl Default for AttributeValue {
    fn default() -> Self {
        AttributeValue::Bool(false)
    }
}

/// A `(key, value)` pair where the key is an interned string id.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Attribute {
    /// Interner id of the attribute key.
    pub key_hash: u64,
    /// The typed value.
    pub value: AttributeValue,
}

impl Attribute {
    /// Pairs an interned key with a value.
    #[inline]
    #[must_use]
    pub fn new(key_hash: u64, value: AttributeValue) -> Self {
        Self { key_hash, value }
    }
}

/// One element of the heterogenous argument pack accepted by span and event
/// creation. Anything that is neither an attribute nor a causal link is
/// unrepresentable, so unsupported argument types fail to compile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpanArg {
    /// An attribute to attach to the record.
    Attribute(Attribute),
    /// An explicit causal link; the first one in the pack wins.
    CausedBy(Id),
}

impl From<Attribute> for SpanArg {
    fn from(attribute: Attribute) -> Self {
        SpanArg::Attribute(attribute)
    }
}

impl From<CausedBy> for SpanArg {
    fn from(cause: CausedBy) -> Self {
        SpanArg::CausedBy(cause.0)
    }
}

/// The argument pack after filtering: the effective cause plus the inline
/// attribute array.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollectedArgs {
    /// First causal link in the pack, or invalid if none was given.
    pub cause: Id,
    /// Inline attributes; slots past `count` are default-initialized.
    pub attributes: [Attribute; MAX_ATTRIBUTES],
    /// Number of live attribute slots.
    pub count: u8,
}

impl CollectedArgs {
    /// The live prefix of the attribute array.
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes[..self.count as usize]
    }
}

/// Filters an argument pack into its cause and inline attributes.
///
/// The first [`SpanArg::CausedBy`] supplies the cause; later ones are
/// ignored. Attributes are copied in order up to [`MAX_ATTRIBUTES`] and
/// silently truncated past that.
#[must_use]
pub fn collect_span_args(args: &[SpanArg]) -> CollectedArgs {
    let mut collected = CollectedArgs::default();
    for arg in args {
        match *arg {
            SpanArg::Attribute(attribute) => {
                if (collected.count as usize) < MAX_ATTRIBUTES {
                    collected.attributes[collected.count as usize] = attribute;
                    collected.count += 1;
                }
            }
            SpanArg::CausedBy(id) => {
                if !collected.cause.is_valid() {
                    collected.cause = id;
                }
            }
        }
    }
    collected
}
