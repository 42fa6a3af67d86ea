//! Hash-based string interning.
//!
//! Names and string-valued attributes are carried through the transport as
//! 64-bit FNV-1a hashes; the interner holds the hash-to-string mapping so the
//! consumer can resolve them back. Static literals hash at compile time via
//! [`StaticName`], so the producer hot path pays one map insert on first use
//! and nothing afterwards.
//!
//! Hash collisions are treated as equality: whichever string was interned
//! first for a hash wins. At 64 bits this is not a practical concern.

use std::collections::HashMap;

use parking_lot::Mutex;

/// FNV-1a offset basis (64-bit).
pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a prime (64-bit).
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Placeholder returned when a hash is unknown to the interner.
///
/// Seen only for ids that were never interned, or transiently when the
/// consumer drains a record before another thread's intern write becomes
/// visible.
pub const UNKNOWN_STRING: &str = "???";

/// 64-bit FNV-1a. Usable in `const` contexts, which is what lets call-site
/// macros hash static names at compile time.
#[must_use]
pub const fn fnv1a_hash(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// A static string with its hash precomputed at compile time.
///
/// Call sites declare one per literal:
///
/// ```
/// use ichnos::StaticName;
/// static NAME: StaticName = StaticName::new("request");
/// assert_eq!(NAME.hash, ichnos::fnv1a_hash(b"request"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StaticName {
    /// FNV-1a hash of `text`.
    pub hash: u64,
    /// The literal itself, registered with the interner on first use.
    pub text: &'static str,
}

impl StaticName {
    /// Hashes `text` at compile time.
    #[must_use]
    pub const fn new(text: &'static str) -> Self {
        Self {
            hash: fnv1a_hash(text.as_bytes()),
            text,
        }
    }
}

/// Shared hash-to-string map.
///
/// Writers and readers synchronise on one mutex; the lock is held only for
/// the map operation itself, never across the record transport. Id 0 is
/// reserved for the empty string.
pub struct StringInterner {
    map: Mutex<HashMap<u64, String>>,
}

impl StringInterner {
    /// Creates an interner with id 0 bound to the empty string.
    #[must_use]
    pub fn new() -> Self {
        let mut map = HashMap::new();
        map.insert(0, String::new());
        Self { map: Mutex::new(map) }
    }

    /// Interns an arbitrary string, copying it on first insertion.
    /// Idempotent; the returned id is stable across calls.
    pub fn intern(&self, text: &str) -> u64 {
        let hash = fnv1a_hash(text.as_bytes());
        let mut map = self.map.lock();
        map.entry(hash).or_insert_with(|| text.to_owned());
        hash
    }

    /// Registers a compile-time-hashed literal. The hash is already known,
    /// so only the first call per literal touches the map entry's value.
    pub fn intern_static(&self, name: &StaticName) -> u64 {
        let mut map = self.map.lock();
        map.entry(name.hash).or_insert_with(|| name.text.to_owned());
        name.hash
    }

    /// Resolves an id back to its string, or [`UNKNOWN_STRING`] if the id
    /// has never been interned here.
    pub fn resolve(&self, id: u64) -> String {
        self.map
            .lock()
            .get(&id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_STRING.to_owned())
    }

    /// Number of interned strings, including the reserved empty string.
    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    /// True when only the reserved empty string is present.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_reference_vectors() {
        assert_eq!(fnv1a_hash(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_hash(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1a_hash(b"foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn static_name_hash_matches_runtime_hash() {
        const NAME: StaticName = StaticName::new("request.handle");
        assert_eq!(NAME.hash, fnv1a_hash(b"request.handle"));
        assert_eq!(NAME.text, "request.handle");
    }

    #[test]
    fn intern_is_idempotent() {
        let interner = StringInterner::new();
        let a = interner.intern("alpha");
        let b = interner.intern("alpha");
        assert_eq!(a, b);
        assert_eq!(interner.resolve(a), "alpha");
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn static_and_dynamic_paths_agree() {
        static NAME: StaticName = StaticName::new("worker.tick");
        let interner = StringInterner::new();
        let via_static = interner.intern_static(&NAME);
        let via_dynamic = interner.intern("worker.tick");
        assert_eq!(via_static, via_dynamic);
        assert_eq!(interner.resolve(via_static), "worker.tick");
    }

    #[test]
    fn unknown_id_resolves_to_placeholder() {
        let interner = StringInterner::new();
        assert_eq!(interner.resolve(0xdead_beef), UNKNOWN_STRING);
    }

    #[test]
    fn id_zero_is_the_empty_string() {
        let interner = StringInterner::new();
        assert_eq!(interner.resolve(0), "");
    }

    #[test]
    fn first_writer_wins_for_a_hash() {
        let interner = StringInterner::new();
        static NAME: StaticName = StaticName::new("first");
        // Forge a second name carrying the same hash to model a collision.
        let forged = StaticName { hash: NAME.hash, text: "second" };
        interner.intern_static(&NAME);
        interner.intern_static(&forged);
        assert_eq!(interner.resolve(NAME.hash), "first");
    }
}
