//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator (admissions, deliveries, session duration)
//! - Printing stage (print attempts, resolutions)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Host outcomes offered for admission, by result.
pub static ADMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postpay_admissions_total", "Host outcomes offered for admission"),
        &["result"], // "started", "failure_bypass", "rejected"
    )
    .unwrap()
});

/// Outcomes handed to the delivery sink.
pub static DELIVERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postpay_deliveries_total", "Outcomes handed to the delivery sink"),
        &["kind"], // "transaction", "reconciliation"
    )
    .unwrap()
});

/// Time from admission to delivery of a session.
pub static SESSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "postpay_session_duration_seconds",
            "Time from admission to delivery",
        )
        .buckets(vec![0.5, 1.0, 1.5, 2.0, 3.0, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Printing Metrics
// =============================================================================

/// Print operations by result.
pub static PRINT_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postpay_print_attempts_total", "Print operations attempted"),
        &["result"], // "success", "error", "busy"
    )
    .unwrap()
});

/// How printing workflows ended.
pub static PRINTING_RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "postpay_printing_resolutions_total",
            "Printing workflows by resolution",
        ),
        &["resolution"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Orchestrator
        Box::new(ADMISSIONS.clone()),
        Box::new(DELIVERIES.clone()),
        Box::new(SESSION_DURATION.clone()),
        // Printing
        Box::new(PRINT_ATTEMPTS.clone()),
        Box::new(PRINTING_RESOLUTIONS.clone()),
    ]
}
