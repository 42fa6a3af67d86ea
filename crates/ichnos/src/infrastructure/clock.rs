//! Monotonic timestamp source for the producer path.

use std::time::Instant;

use once_cell::sync::Lazy;

/// Process-wide epoch, fixed on first use.
static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Nanoseconds elapsed since the process-wide epoch.
///
/// Monotonic, so timestamps are non-decreasing within a thread (and across
/// threads, up to scheduling).
#[inline]
#[must_use]
pub fn monotonic_ns() -> u64 {
    EPOCH.elapsed().as_nanos() as u64
}
