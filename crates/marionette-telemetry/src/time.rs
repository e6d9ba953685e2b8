// Path: crates/marionette-telemetry/src/time.rs
use crate::sinks::OperatorMetricsSink;
use std::time::Instant;

/// Observes the lifetime of a screenshot capture when dropped.
pub struct Timer<'a> {
    sink: &'a dyn OperatorMetricsSink,
    backend: &'a str,
    start: Instant,
}

impl<'a> Timer<'a> {
    pub fn new(sink: &'a dyn OperatorMetricsSink, backend: &'a str) -> Self {
        Self {
            sink,
            backend,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.sink
            .observe_screenshot_duration(self.backend, self.start.elapsed().as_secs_f64());
    }
}
