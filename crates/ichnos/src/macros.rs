//! Call-site macros.
//!
//! Each invocation with a literal name declares one `static` hashed name, so
//! the hash is computed at compile time and interned once per call site. The
//! parent is read implicitly from the calling thread's span context. Only
//! `caused_by = <id>` and `"key" => value` arguments are accepted; anything
//! else fails to compile.

/// Begins a span on the given tracer and returns its RAII handle.
///
/// ```
/// use ichnos::{CollectSink, Tracer};
///
/// let tracer = Tracer::new(CollectSink::new()).unwrap();
/// let parent = ichnos::span!(tracer, "request", "peer" => "10.0.0.1");
/// let child = ichnos::span!(tracer, "parse", caused_by = parent.id());
/// drop(child);
/// drop(parent);
/// ```
#[macro_export]
macro_rules! span {
    ($tracer:expr, $name:literal $(,)?) => {{
        static NAME: $crate::StaticName = $crate::StaticName::new($name);
        ($tracer).begin_span(&NAME, &[])
    }};
    ($tracer:expr, $name:literal, caused_by = $cause:expr $(, $key:literal => $value:expr)* $(,)?) => {{
        static NAME: $crate::StaticName = $crate::StaticName::new($name);
        let tracer = &($tracer);
        tracer.begin_span(
            &NAME,
            &[
                $crate::SpanArg::CausedBy($cause),
                $($crate::SpanArg::Attribute(tracer.attr($key, $value))),*
            ],
        )
    }};
    ($tracer:expr, $name:literal $(, $key:literal => $value:expr)+ $(,)?) => {{
        static NAME: $crate::StaticName = $crate::StaticName::new($name);
        let tracer = &($tracer);
        tracer.begin_span(
            &NAME,
            &[$($crate::SpanArg::Attribute(tracer.attr($key, $value))),+],
        )
    }};
}

/// Emits an event on the given tracer, attached to the calling thread's
/// current span.
///
/// ```
/// use ichnos::{CollectSink, Tracer};
///
/// let tracer = Tracer::new(CollectSink::new()).unwrap();
/// let _span = ichnos::span!(tracer, "request");
/// ichnos::event!(tracer, "cache_miss", "key" => "user:42");
/// ```
#[macro_export]
macro_rules! event {
    ($tracer:expr, $name:literal $(,)?) => {{
        static NAME: $crate::StaticName = $crate::StaticName::new($name);
        ($tracer).create_event(&NAME, &[]);
    }};
    ($tracer:expr, $name:literal, caused_by = $cause:expr $(, $key:literal => $value:expr)* $(,)?) => {{
        static NAME: $crate::StaticName = $crate::StaticName::new($name);
        let tracer = &($tracer);
        tracer.create_event(
            &NAME,
            &[
                $crate::SpanArg::CausedBy($cause),
                $($crate::SpanArg::Attribute(tracer.attr($key, $value))),*
            ],
        );
    }};
    ($tracer:expr, $name:literal $(, $key:literal => $value:expr)+ $(,)?) => {{
        static NAME: $crate::StaticName = $crate::StaticName::new($name);
        let tracer = &($tracer);
        tracer.create_event(
            &NAME,
            &[$($crate::SpanArg::Attribute(tracer.attr($key, $value))),+],
        );
    }};
}
