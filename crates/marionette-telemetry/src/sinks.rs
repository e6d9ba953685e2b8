// Path: crates/marionette-telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling operator logic from the backend.

use once_cell::sync::OnceCell;

// --- Static Sink Access ---

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global `MetricsSink` implementation.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns a static reference to the configured operator metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn operator_metrics() -> &'static dyn OperatorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured error metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

// --- Trait Definitions ---

/// A sink for metrics produced by operators and the retry wrapper.
pub trait OperatorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the counter of executed actions, labeled by backend and action kind.
    fn inc_actions_executed(&self, backend: &str, kind: &str);
    /// Increments the counter of dropped actions, labeled by backend and reason.
    fn inc_actions_skipped(&self, backend: &str, reason: &str);
    /// Observes the latency of one remote RPC call, labeled by verb.
    fn observe_rpc_duration(&self, verb: &str, duration_secs: f64);
    /// Observes the latency of one screenshot, labeled by backend.
    fn observe_screenshot_duration(&self, backend: &str, duration_secs: f64);
    /// Increments the counter of retried attempts, labeled by operation class.
    fn inc_retry_attempts(&self, class: &str);
    /// Increments the counter of exhausted retry budgets, labeled by operation class.
    fn inc_retries_exhausted(&self, class: &str);
}
impl OperatorMetricsSink for NopSink {
    fn inc_actions_executed(&self, _backend: &str, _kind: &str) {}
    fn inc_actions_skipped(&self, _backend: &str, _reason: &str) {}
    fn observe_rpc_duration(&self, _verb: &str, _duration_secs: f64) {}
    fn observe_screenshot_duration(&self, _backend: &str, _duration_secs: f64) {}
    fn inc_retry_attempts(&self, _class: &str) {}
    fn inc_retries_exhausted(&self, _class: &str) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and code.
    fn inc_error(&self, kind: &'static str, code: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _code: &'static str) {}
}

/// A unified trait for a sink that implements all metric categories.
pub trait MetricsSink: OperatorMetricsSink + ErrorMetricsSink {}

impl<T> MetricsSink for T where T: OperatorMetricsSink + ErrorMetricsSink {}
