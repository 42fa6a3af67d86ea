//! Walkthrough of explicit and implicit causal links.
//!
//! A first span completes and becomes the causal anchor. A second span is
//! explicitly caused by it; a nested child and an event inside carry no
//! cause of their own, so the processor walks the parent chain and
//! attributes the event to the original anchor, marked implicit.
//!
//! Run with: `cargo run --example implicit_causality`

use std::thread;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt::init();

    let tracer = ichnos::global::setup().expect("tracer setup failed");

    let mut initial_cause = ichnos::span!(tracer, "initial_cause");
    let cause = initial_cause.id();
    initial_cause.end();

    let parent = ichnos::span!(tracer, "parent_with_cause", caused_by = cause, "parent_attr" => 100);

    thread::sleep(Duration::from_millis(10));

    {
        let _child = ichnos::span!(tracer, "nested_child_no_cause", "child_attr" => "hello");

        thread::sleep(Duration::from_millis(10));

        // No explicit cause here: the processor traverses up through
        // nested_child_no_cause to parent_with_cause and reports the
        // original anchor as an implicit cause.
        ichnos::event!(tracer, "important_event", "status" => "processing");
    }

    drop(parent);

    // Give the processor time to drain before tearing down.
    thread::sleep(Duration::from_millis(200));
    ichnos::global::shutdown();
}
