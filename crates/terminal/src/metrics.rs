//! Prometheus metrics for the terminal binary.
//!
//! The registry carries the core metrics plus a few for the console input
//! and output. They are dumped to the log on shutdown.

use once_cell::sync::Lazy;
use prometheus::{self, Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Input lines read from stdin, by result.
pub static INPUT_LINES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postpay_input_lines_total", "Input lines read from stdin"),
        &["result"], // "submitted", "rejected", "invalid"
    )
    .unwrap()
});

/// Outcomes written to stdout.
pub static OUTCOMES_WRITTEN: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postpay_outcomes_written_total", "Outcomes written to stdout"),
        &["status"], // "approved", "failed"
    )
    .unwrap()
});

/// Whether the orchestrator is running (1) or not (0).
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "postpay_orchestrator_running",
        "Whether the orchestrator is running",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(INPUT_LINES.clone())).unwrap();
    registry
        .register(Box::new(OUTCOMES_WRITTEN.clone()))
        .unwrap();
    registry
        .register(Box::new(ORCHESTRATOR_RUNNING.clone()))
        .unwrap();

    // Core metrics (orchestrator, printing, delivery)
    for metric in postpay_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
