//! Unified error types for the tracing core.
//!
//! Only construction-time failures surface as errors. The steady-state
//! conditions of the transport ("buffer full" on the producer side, "buffer
//! empty" on the consumer side) are ordinary return values: instrumentation
//! must never alter the control flow of the instrumented program.

use std::fmt;
use std::io;

/// Errors that can occur while constructing the tracing machinery.
#[derive(Debug)]
pub enum TraceError {
    /// A ring buffer was requested with capacity zero.
    ZeroCapacity,
    /// The record processor thread could not be spawned.
    WorkerSpawn(io::Error),
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::ZeroCapacity => write!(f, "ring buffer capacity must be non-zero"),
            TraceError::WorkerSpawn(err) => {
                write!(f, "failed to spawn record processor thread: {err}")
            }
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TraceError::ZeroCapacity => None,
            TraceError::WorkerSpawn(err) => Some(err),
        }
    }
}

/// Convenience result alias for fallible constructors.
pub type TraceResult<T> = Result<T, TraceError>;
