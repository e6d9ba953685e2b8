// Path: crates/marionette-telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};

// --- Metric Statics ---
// Collectors are registered exactly once by `install`. Until then every
// observation is a no-op.

static ACTIONS_EXECUTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static ACTIONS_SKIPPED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static RPC_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static SCREENSHOT_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static RETRY_ATTEMPTS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static RETRIES_EXHAUSTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

impl OperatorMetricsSink for PrometheusSink {
    fn inc_actions_executed(&self, backend: &str, kind: &str) {
        if let Some(m) = ACTIONS_EXECUTED_TOTAL.get() {
            m.with_label_values(&[backend, kind]).inc();
        }
    }
    fn inc_actions_skipped(&self, backend: &str, reason: &str) {
        if let Some(m) = ACTIONS_SKIPPED_TOTAL.get() {
            m.with_label_values(&[backend, reason]).inc();
        }
    }
    fn observe_rpc_duration(&self, verb: &str, duration_secs: f64) {
        if let Some(m) = RPC_DURATION_SECONDS.get() {
            m.with_label_values(&[verb]).observe(duration_secs);
        }
    }
    fn observe_screenshot_duration(&self, backend: &str, duration_secs: f64) {
        if let Some(m) = SCREENSHOT_DURATION_SECONDS.get() {
            m.with_label_values(&[backend]).observe(duration_secs);
        }
    }
    fn inc_retry_attempts(&self, class: &str) {
        if let Some(m) = RETRY_ATTEMPTS_TOTAL.get() {
            m.with_label_values(&[class]).inc();
        }
    }
    fn inc_retries_exhausted(&self, class: &str) {
        if let Some(m) = RETRIES_EXHAUSTED_TOTAL.get() {
            m.with_label_values(&[class]).inc();
        }
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, code: &'static str) {
        if let Some(m) = ERRORS_TOTAL.get() {
            m.with_label_values(&[kind, code]).inc();
        }
    }
}

/// Registers all collectors with the default registry and installs the sink
/// globally. Calling it twice is harmless: the first registration wins.
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    static PROMETHEUS_SINK: PrometheusSink = PrometheusSink;
    if let Some(sink) = SINK.get() {
        return Ok(*sink);
    }

    let _ = ACTIONS_EXECUTED_TOTAL.set(register_int_counter_vec!(
        "marionette_actions_executed_total",
        "Total actions that produced input events, by backend and action kind.",
        &["backend", "kind"]
    )?);
    let _ = ACTIONS_SKIPPED_TOTAL.set(register_int_counter_vec!(
        "marionette_actions_skipped_total",
        "Total malformed or unsupported actions dropped, by backend and reason.",
        &["backend", "reason"]
    )?);
    let _ = RPC_DURATION_SECONDS.set(register_histogram_vec!(
        "marionette_rpc_duration_seconds",
        "Latency of remote operator RPC calls.",
        &["verb"],
        exponential_buckets(0.005, 2.0, 12)?
    )?);
    let _ = SCREENSHOT_DURATION_SECONDS.set(register_histogram_vec!(
        "marionette_screenshot_duration_seconds",
        "Latency of screenshot capture.",
        &["backend"],
        exponential_buckets(0.01, 2.0, 10)?
    )?);
    let _ = RETRY_ATTEMPTS_TOTAL.set(register_int_counter_vec!(
        "marionette_retry_attempts_total",
        "Total failed attempts that consumed a retry budget.",
        &["class"]
    )?);
    let _ = RETRIES_EXHAUSTED_TOTAL.set(register_int_counter_vec!(
        "marionette_retries_exhausted_total",
        "Total retry budgets exhausted.",
        &["class"]
    )?);
    let _ = ERRORS_TOTAL.set(register_int_counter_vec!(
        "marionette_errors_total",
        "Total number of errors, categorized by kind and code.",
        &["kind", "code"]
    )?);

    let _ = SINK.set(&PROMETHEUS_SINK);
    Ok(SINK.get().copied().unwrap_or(&PROMETHEUS_SINK))
}

/// Renders every registered metric in the Prometheus text exposition format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::error!(error = %e, "Failed to encode prometheus metrics");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_is_idempotent_and_renders() {
        let sink = install().unwrap();
        sink.inc_retry_attempts("execute");
        assert!(install().is_ok());
        crate::operator_metrics().inc_actions_executed("local", "click");
        let text = render();
        assert!(text.contains("marionette_retry_attempts_total"));
        assert!(text.contains("marionette_actions_executed_total"));
    }
}
