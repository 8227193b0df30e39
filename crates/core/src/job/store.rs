//! Job and object record storage traits.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{Job, JobPage, JobStatus, ObjectRecord};
use crate::batch::BatchJobStatus;

/// Error type for table store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Trait for job table backends.
pub trait JobStore: Send + Sync {
    /// Insert (or overwrite) a job row.
    fn create(&self, job: &Job) -> Result<(), StoreError>;

    /// Get a job by ID.
    fn get(&self, id: &str) -> Result<Option<Job>, StoreError>;

    /// Number of open jobs.
    fn count(&self) -> Result<u64, StoreError>;

    /// Read one page of the full table, ordered by job ID.
    fn scan(&self, start_after: Option<&str>, limit: usize) -> Result<JobPage, StoreError>;

    /// Persist the first terminal batch status observed for a job and reset
    /// its progress to 0.
    fn record_batch_status(
        &self,
        id: &str,
        status: JobStatus,
        batch_status: BatchJobStatus,
        failed_files: u64,
    ) -> Result<(), StoreError>;

    /// Persist a new progress value; the job is `Restoring` afterwards.
    fn update_progress(&self, id: &str, progress_percent: u32) -> Result<(), StoreError>;

    /// Delete a job row. Returns false if it was already gone.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// Trait for object record table backends.
pub trait ObjectRecordStore: Send + Sync {
    /// Write records in one batch, overwriting existing keys.
    fn put_batch(&self, records: &[ObjectRecord]) -> Result<(), StoreError>;

    /// Get a record by its (bucket, key).
    fn get(&self, bucket: &str, key: &str) -> Result<Option<ObjectRecord>, StoreError>;

    /// Set `restored = true`. Returns false if no record matches.
    fn mark_restored(&self, bucket: &str, key: &str) -> Result<bool, StoreError>;

    /// Count a job's records with the given restored flag.
    fn count_by_job(&self, job_id: &str, restored: bool) -> Result<u64, StoreError>;

    /// Remove records whose expiry is at or before `now`. Returns the number removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
