//! One reconcile pass over every open job.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::batch::{BatchJobStatus, BatchService};
use crate::job::{Job, JobStatus, JobStore, ObjectRecordStore};
use crate::metrics;
use crate::notify::{JobNotification, NotificationPublisher};

use super::config::ReconcilerConfig;
use super::types::{PassSummary, ReconcileError};

/// Working status a finished bulk operation translates to.
///
/// A completed bulk operation only means every restore was requested; the
/// objects themselves are tracked through their records. Unfinished statuses
/// translate to nothing and leave the job unreconciled.
pub fn working_status(batch_status: &BatchJobStatus) -> Option<JobStatus> {
    if !batch_status.is_finished() {
        return None;
    }
    match batch_status {
        BatchJobStatus::Complete => Some(JobStatus::Restoring),
        BatchJobStatus::Failed => Some(JobStatus::Failed),
        _ => Some(JobStatus::Cancelled),
    }
}

/// Coarse progress: `done / total` rounded half to even, not scaled to a
/// percentage. An empty job reports 0.
pub fn coarse_progress(done: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (done as f64 / total as f64).round_ties_even() as u32
}

/// Collaborators a pass needs. Cheap to clone into background tasks.
#[derive(Clone)]
pub(crate) struct PassContext {
    pub account_id: String,
    pub config: ReconcilerConfig,
    pub jobs: Arc<dyn JobStore>,
    pub records: Arc<dyn ObjectRecordStore>,
    pub batch: Arc<dyn BatchService>,
    pub publisher: Arc<dyn NotificationPublisher>,
}

impl PassContext {
    /// Reconcile every job in the table.
    pub async fn run(&self, now: DateTime<Utc>) -> PassSummary {
        let timer = metrics::RECONCILE_PASS_DURATION.start_timer();
        let mut summary = PassSummary::new(now);

        let jobs = self.read_all_jobs(&mut summary);
        summary.jobs_seen = jobs.len() as u64;

        for job in jobs {
            self.reconcile_job(job, now, &mut summary).await;
        }

        summary.duration_ms = (timer.stop_and_record() * 1000.0) as u64;
        metrics::RECONCILE_PASSES.inc();

        info!(
            jobs = summary.jobs_seen,
            progress_updates = summary.progress_updates,
            completed = summary.completed,
            cancelled = summary.cancelled,
            failed = summary.failed,
            timed_out = summary.timed_out,
            errors = summary.errors,
            "Reconcile pass finished"
        );
        summary
    }

    /// Page through the job table. A failed page ends the listing; jobs
    /// already read are still reconciled.
    fn read_all_jobs(&self, summary: &mut PassSummary) -> Vec<Job> {
        let mut jobs = Vec::new();
        let mut start_after: Option<String> = None;

        loop {
            match self
                .jobs
                .scan(start_after.as_deref(), self.config.scan_page_size)
            {
                Ok(page) => {
                    jobs.extend(page.jobs);
                    match page.last_evaluated_key {
                        Some(key) => start_after = Some(key),
                        None => break,
                    }
                }
                Err(e) => {
                    error!(error = %e, read = jobs.len(), "Job scan failed");
                    summary.errors += 1;
                    break;
                }
            }
        }

        jobs
    }

    async fn reconcile_job(
        &self,
        mut job: Job,
        now: DateTime<Utc>,
        summary: &mut PassSummary,
    ) {
        // Step 1: first look at the bulk operation
        if job.status.is_none() {
            self.observe_batch_status(&mut job, summary).await;
        }

        // Step 2: object counts; a store error skips only this step
        if job.status == Some(JobStatus::Restoring) {
            if let Err(e) = self.reconcile_progress(&mut job, summary).await {
                error!(job_id = %job.id, error = %e, "Failed to reconcile job progress");
                summary.errors += 1;
            }
        }

        // Step 3: deadline
        if job.is_past_deadline(now, self.config.job_deadline()) {
            info!(job_id = %job.id, created_at = %job.created_at, "Job timed out");
            self.finish(&job, JobStatus::Timeout, 0, summary).await;
        }

        // Step 4: bulk operation failed or was cancelled
        if let Some(status @ (JobStatus::Failed | JobStatus::Cancelled)) = job.status {
            info!(job_id = %job.id, status = %status, "Bulk operation ended without restoring");
            self.finish(&job, status, 0, summary).await;
        }
    }

    /// Describe the bulk operation and persist a finished status.
    ///
    /// On a describe failure `job.status` stays `None`.
    async fn observe_batch_status(&self, job: &mut Job, summary: &mut PassSummary) {
        let description = match self
            .batch
            .describe(&self.account_id, &job.batch_job_id)
            .await
        {
            Ok(description) => description,
            Err(e) => {
                warn!(job_id = %job.id, batch_job_id = %job.batch_job_id, error = %e, "Failed to describe bulk operation");
                summary.errors += 1;
                return;
            }
        };

        let Some(status) = working_status(&description.status) else {
            debug!(job_id = %job.id, batch_status = %description.status, "Bulk operation still running");
            return;
        };

        let failed_files = description.failed_task_count.unwrap_or(0);
        info!(
            job_id = %job.id,
            batch_status = %description.status,
            status = %status,
            failed_files,
            "Bulk operation finished"
        );

        if let Err(e) =
            self.jobs
                .record_batch_status(&job.id, status, description.status.clone(), failed_files)
        {
            // Keep going with the observed status; the next pass re-describes
            warn!(job_id = %job.id, error = %e, "Failed to persist bulk operation status");
            summary.errors += 1;
        }

        job.status = Some(status);
        job.batch_status = Some(description.status);
        job.failed_files = failed_files;
        job.progress_percent = Some(0);
    }

    async fn reconcile_progress(
        &self,
        job: &mut Job,
        summary: &mut PassSummary,
    ) -> Result<(), ReconcileError> {
        let pending = self.records.count_by_job(&job.id, false)?;
        let done = self.records.count_by_job(&job.id, true)?;
        debug!(job_id = %job.id, pending, done, total = job.total_files, "Object counts");

        if pending == 0 && done == 0 {
            info!(job_id = %job.id, "Job has no objects");
            self.finish(job, JobStatus::Cancelled, 0, summary).await;
            return Ok(());
        }

        if pending == 0 {
            info!(job_id = %job.id, restored = done, "All objects restored");
            self.finish(job, JobStatus::Complete, 100, summary).await;
            return Ok(());
        }

        let progress = coarse_progress(done, job.total_files);
        let previous = job.progress_percent;
        if previous == Some(progress) {
            debug!(job_id = %job.id, progress, "Progress unchanged");
            return Ok(());
        }

        self.jobs.update_progress(&job.id, progress)?;
        job.progress_percent = Some(progress);
        summary.progress_updates += 1;

        info!(job_id = %job.id, ?previous, progress, "Job progress changed");
        self.notify(job, JobStatus::Restoring, progress).await;
        Ok(())
    }

    /// Delete the job row and, if that worked, publish the terminal status.
    async fn finish(&self, job: &Job, status: JobStatus, progress: u32, summary: &mut PassSummary) {
        match self.jobs.delete(&job.id) {
            Ok(existed) => {
                if !existed {
                    debug!(job_id = %job.id, "Job row already removed");
                }
                metrics::JOB_TRANSITIONS
                    .with_label_values(&[status.as_str()])
                    .inc();
                summary.record_terminal(status);
                self.notify(job, status, progress).await;
            }
            Err(e) => {
                error!(job_id = %job.id, status = %status, error = %e, "Failed to delete job, notification suppressed");
                summary.errors += 1;
            }
        }
    }

    async fn notify(&self, job: &Job, status: JobStatus, progress: u32) {
        let notification = JobNotification {
            job_id: job.id.clone(),
            batch_job_id: job.batch_job_id.clone(),
            status,
            progress_percent: progress,
            failed_batch_files: job.failed_files,
        };

        let publisher = self.publisher.name();
        match self.publisher.publish(&notification).await {
            Ok(()) => {
                metrics::NOTIFICATIONS
                    .with_label_values(&[publisher, "success"])
                    .inc();
            }
            Err(e) => {
                metrics::NOTIFICATIONS
                    .with_label_values(&[publisher, "failed"])
                    .inc();
                warn!(job_id = %job.id, status = %status, error = %e, "Failed to publish notification");
            }
        }
    }
}
