//! Job and object record types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::BatchJobStatus;

/// How long an object record is kept before the expiry sweep removes it.
pub const OBJECT_RECORD_TTL_DAYS: i64 = 7;

/// Reconciled status of a restore job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Bulk operation finished submitting; objects are still being restored.
    Restoring,
    /// Every tracked object reported completion.
    Complete,
    /// Bulk operation was cancelled, or the manifest had no objects.
    Cancelled,
    /// Bulk operation failed.
    Failed,
    /// Job exceeded its deadline.
    Timeout,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Restoring => "Restoring",
            JobStatus::Complete => "Complete",
            JobStatus::Cancelled => "Cancelled",
            JobStatus::Failed => "Failed",
            JobStatus::Timeout => "Timeout",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown job status: {0}")]
pub struct ParseJobStatusError(String);

impl FromStr for JobStatus {
    type Err = ParseJobStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Restoring" => Ok(JobStatus::Restoring),
            "Complete" => Ok(JobStatus::Complete),
            "Cancelled" => Ok(JobStatus::Cancelled),
            "Failed" => Ok(JobStatus::Failed),
            "Timeout" => Ok(JobStatus::Timeout),
            other => Err(ParseJobStatusError(other.to_string())),
        }
    }
}

/// One bulk restore request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job ID, also the idempotency token of the bulk submission.
    pub id: String,
    /// Identifier of the underlying bulk operation.
    pub batch_job_id: String,
    /// Number of manifest lines, fixed at creation.
    pub total_files: u64,
    pub created_at: DateTime<Utc>,
    /// None until the first reconciliation observed a terminal batch status.
    pub status: Option<JobStatus>,
    /// Raw provider status that produced `status`.
    pub batch_status: Option<BatchJobStatus>,
    /// Last persisted progress.
    pub progress_percent: Option<u32>,
    /// Tasks the bulk operation reported as failed.
    pub failed_files: u64,
}

impl Job {
    /// Create an unreconciled job stamped with the current time.
    pub fn new(id: impl Into<String>, batch_job_id: impl Into<String>, total_files: u64) -> Self {
        Self {
            id: id.into(),
            batch_job_id: batch_job_id.into(),
            total_files,
            created_at: Utc::now(),
            status: None,
            batch_status: None,
            progress_percent: None,
            failed_files: 0,
        }
    }

    pub fn is_past_deadline(&self, now: DateTime<Utc>, deadline: Duration) -> bool {
        now > self.created_at + deadline
    }
}

/// Tracking row for one object of a restore job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub bucket: String,
    pub key: String,
    pub job_id: String,
    pub restored: bool,
    pub expires_at: DateTime<Utc>,
}

impl ObjectRecord {
    /// New pending record that expires `OBJECT_RECORD_TTL_DAYS` after `now`.
    pub fn pending(
        bucket: impl Into<String>,
        key: impl Into<String>,
        job_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            job_id: job_id.into(),
            restored: false,
            expires_at: now + Duration::days(OBJECT_RECORD_TTL_DAYS),
        }
    }
}

/// One page of a job table scan.
#[derive(Debug, Clone, Default)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    /// Set when more rows may follow; pass it back as `start_after`.
    pub last_evaluated_key: Option<String>,
}
