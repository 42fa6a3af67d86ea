//! Per-thread span context.
//!
//! Each thread tracks the pair `(trace_id, span_id)` of its currently-active
//! span. Carrying the trace id alongside the span id is what lets a child
//! span inherit its parent's true trace id instead of mistaking the parent's
//! span id for one. New threads always start with an empty context,
//! independent of any tracer's lifecycle.

use std::cell::Cell;

use super::types::Id;

/// The `(trace, span)` pair identifying a position inside a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpanContext {
    /// Trace the span belongs to.
    pub trace_id: Id,
    /// The span itself.
    pub span_id: Id,
}

impl SpanContext {
    /// The empty context: no active span, no trace.
    pub const EMPTY: SpanContext = SpanContext {
        trace_id: Id::INVALID,
        span_id: Id::INVALID,
    };

    /// True when no span is active.
    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        !self.span_id.is_valid()
    }
}

thread_local! {
    static CURRENT: Cell<SpanContext> = Cell::new(SpanContext::EMPTY);
}

/// The calling thread's current span context.
#[inline]
#[must_use]
pub fn current() -> SpanContext {
    CURRENT.with(Cell::get)
}

/// Replaces the calling thread's current span context, returning the
/// previous value.
#[inline]
pub fn set_current(context: SpanContext) -> SpanContext {
    CURRENT.with(|cell| cell.replace(context))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_thread_has_empty_context() {
        std::thread::spawn(|| {
            assert_eq!(current(), SpanContext::EMPTY);
            assert!(current().is_empty());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn set_current_returns_previous() {
        std::thread::spawn(|| {
            let ctx = SpanContext { trace_id: Id(1), span_id: Id(2) };
            assert_eq!(set_current(ctx), SpanContext::EMPTY);
            assert_eq!(current(), ctx);
            assert_eq!(set_current(SpanContext::EMPTY), ctx);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn context_is_thread_isolated() {
        std::thread::spawn(|| {
            set_current(SpanContext { trace_id: Id(7), span_id: Id(7) });
            std::thread::spawn(|| assert_eq!(current(), SpanContext::EMPTY))
                .join()
                .unwrap();
        })
        .join()
        .unwrap();
    }
}
