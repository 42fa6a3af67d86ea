//! Process-wide tracer instance.
//!
//! Call-site macros and libraries that do not want to thread a tracer handle
//! around can install one tracer per process. Installation happens at most
//! once; later calls return the existing instance.

use once_cell::sync::OnceCell;

use crate::adapters::sink::{RecordSink, StdoutSink};
use crate::error::TraceResult;
use crate::tracer::{Tracer, TracerConfig};

static GLOBAL: OnceCell<Tracer> = OnceCell::new();

/// Installs the default tracer (capacity 8192, stdout sink) if none exists
/// yet, and returns the process-wide instance.
pub fn setup() -> TraceResult<&'static Tracer> {
    setup_with(TracerConfig::default(), StdoutSink)
}

/// Installs a tracer with the given configuration and sink if none exists
/// yet. When a tracer is already installed it is returned unchanged and the
/// arguments are ignored.
pub fn setup_with<S>(config: TracerConfig, sink: S) -> TraceResult<&'static Tracer>
where
    S: RecordSink + Send + 'static,
{
    GLOBAL.get_or_try_init(|| Tracer::with_config(config, sink))
}

/// The installed tracer, if any.
#[must_use]
pub fn tracer() -> Option<&'static Tracer> {
    GLOBAL.get()
}

/// Stops the installed tracer's processor thread and joins it. Safe to call
/// without a prior [`setup`]; idempotent.
pub fn shutdown() {
    if let Some(tracer) = GLOBAL.get() {
        tracer.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sink::CollectSink;

    // One test exercises the whole lifecycle: the instance is process-wide,
    // so splitting this up would make the pieces order-dependent.
    #[test]
    fn setup_is_once_and_shutdown_is_idempotent() {
        assert!(tracer().is_none());

        let sink = CollectSink::new();
        let first = setup_with(TracerConfig::default(), sink).unwrap();
        let second = setup().unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(tracer().is_some());

        let span = first.begin_span_dyn("global_span", &[]);
        assert!(span.id().is_valid());
        drop(span);

        shutdown();
        shutdown();
    }
}
