//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator (transfer outcomes, duration, resumptions)
//! - Worker invocations (results, call latency, retries)
//! - Notifications

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Finished transfers by result.
pub static TRANSFERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vodmigrator_transfers_total", "Total finished transfers"),
        &["result"], // "success", "cancelled", or an error code
    )
    .unwrap()
});

/// End-to-end run duration in seconds.
pub static TRANSFER_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "vodmigrator_transfer_duration_seconds",
            "Duration of a transfer run",
        )
        .buckets(vec![1.0, 10.0, 60.0, 300.0, 900.0, 1800.0, 3600.0, 7200.0, 14400.0]),
    )
    .unwrap()
});

/// Continuation cycles across all transfers.
pub static RESUMPTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vodmigrator_resumptions_total",
        "Worker invocations repeated because the worker stopped early",
    )
    .unwrap()
});

// =============================================================================
// Worker Metrics
// =============================================================================

/// Worker calls by result.
pub static WORKER_INVOCATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vodmigrator_worker_invocations_total", "Total worker calls"),
        &["result"], // a worker status or an invocation error kind
    )
    .unwrap()
});

/// Worker call latency in seconds.
pub static WORKER_CALL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vodmigrator_worker_call_duration_seconds",
            "Duration of a single worker call",
        )
        .buckets(vec![0.1, 1.0, 10.0, 60.0, 300.0, 600.0, 900.0]),
        &["worker"],
    )
    .unwrap()
});

/// Retries of failed worker calls.
pub static RETRY_ATTEMPTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vodmigrator_worker_retry_attempts_total",
        "Worker calls retried after an invocation failure",
    )
    .unwrap()
});

// =============================================================================
// Notification Metrics
// =============================================================================

/// Published notifications by lifecycle stage and status.
pub static NOTIFICATIONS_PUBLISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vodmigrator_notifications_total",
            "Total notification publish attempts",
        ),
        &["stage", "status"], // status: "success" or "error"
    )
    .unwrap()
});

/// Get all metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Orchestrator
        Box::new(TRANSFERS_TOTAL.clone()),
        Box::new(TRANSFER_DURATION.clone()),
        Box::new(RESUMPTIONS.clone()),
        // Worker
        Box::new(WORKER_INVOCATIONS.clone()),
        Box::new(WORKER_CALL_DURATION.clone()),
        Box::new(RETRY_ATTEMPTS.clone()),
        // Notifications
        Box::new(NOTIFICATIONS_PUBLISHED.clone()),
    ]
}
