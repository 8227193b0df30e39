//! Reconciler types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::batch::BatchError;
use crate::job::{JobStatus, StoreError};

/// Errors that abort reconciliation of one job.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Batch service error: {0}")]
    Batch(#[from] BatchError),
}

/// Result of one reconcile pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub jobs_seen: u64,
    pub progress_updates: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub errors: u64,
}

impl PassSummary {
    pub(crate) fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            duration_ms: 0,
            jobs_seen: 0,
            progress_updates: 0,
            completed: 0,
            cancelled: 0,
            failed: 0,
            timed_out: 0,
            errors: 0,
        }
    }

    pub(crate) fn record_terminal(&mut self, status: JobStatus) {
        match status {
            JobStatus::Complete => self.completed += 1,
            JobStatus::Cancelled => self.cancelled += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Timeout => self.timed_out += 1,
            JobStatus::Restoring => {}
        }
    }
}

/// Current reconciler status.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcilerStatus {
    /// Whether the background loops are running.
    pub running: bool,
    pub poll_interval_ms: u64,
    pub passes_run: u64,
    pub open_jobs: Option<u64>,
    pub last_pass: Option<PassSummary>,
}
