//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job intake (submissions, tracked objects)
//! - Completion listener (events by outcome)
//! - Reconciler (passes, transitions, notifications)
//! - Expiry sweeper

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Intake Metrics
// =============================================================================

/// Intake submissions by result.
pub static INTAKE_SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bulkrestore_intake_submissions_total",
            "Total restore job submissions",
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Object records created by intake.
pub static OBJECTS_TRACKED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "bulkrestore_objects_tracked_total",
        "Total object records created by intake",
    )
    .unwrap()
});

// =============================================================================
// Listener Metrics
// =============================================================================

/// Delivered messages by outcome.
pub static LISTENER_MESSAGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bulkrestore_listener_messages_total",
            "Total completion messages handled",
        ),
        &["outcome"], // "processed", "ignored", "rejected", "failed"
    )
    .unwrap()
});

// =============================================================================
// Reconciler Metrics
// =============================================================================

/// Reconcile passes run.
pub static RECONCILE_PASSES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "bulkrestore_reconcile_passes_total",
        "Total reconcile passes",
    )
    .unwrap()
});

/// Reconcile pass duration in seconds.
pub static RECONCILE_PASS_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "bulkrestore_reconcile_pass_duration_seconds",
            "Duration of one reconcile pass",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]),
    )
    .unwrap()
});

/// Job transitions by status.
pub static JOB_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bulkrestore_job_transitions_total", "Job status transitions"),
        &["status"],
    )
    .unwrap()
});

/// Notifications published by result.
pub static NOTIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bulkrestore_notifications_total",
            "Total job notifications published",
        ),
        &["publisher", "result"], // result: "success", "failed"
    )
    .unwrap()
});

/// Object records removed by the expiry sweeper.
pub static EXPIRED_RECORDS_PURGED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "bulkrestore_expired_records_purged_total",
        "Object records removed after expiry",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Intake
        Box::new(INTAKE_SUBMISSIONS.clone()),
        Box::new(OBJECTS_TRACKED.clone()),
        // Listener
        Box::new(LISTENER_MESSAGES.clone()),
        // Reconciler
        Box::new(RECONCILE_PASSES.clone()),
        Box::new(RECONCILE_PASS_DURATION.clone()),
        Box::new(JOB_TRANSITIONS.clone()),
        Box::new(NOTIFICATIONS.clone()),
        Box::new(EXPIRED_RECORDS_PURGED.clone()),
    ]
}
