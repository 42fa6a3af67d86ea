//! Concurrency and timing machinery underneath the tracing domain.

pub mod clock;
pub mod interner;
pub mod ring;

pub use clock::monotonic_ns;
pub use interner::{fnv1a_hash, StaticName, StringInterner, UNKNOWN_STRING};
pub use ring::{next_power_of_two, MpscRingBuffer};
