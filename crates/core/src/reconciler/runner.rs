//! Background reconciler.
//!
//! Two loops run while started:
//! - Reconcile: one pass every `poll_interval_ms`
//! - Expiry sweep: purge expired object records every `expiry_sweep_interval_ms`
//!
//! Passes are serialized; an on-demand pass waits for a running one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::batch::BatchService;
use crate::job::{JobStore, ObjectRecordStore, StoreError};
use crate::metrics;
use crate::notify::NotificationPublisher;

use super::config::ReconcilerConfig;
use super::pass::PassContext;
use super::types::{PassSummary, ReconcilerStatus};

/// Drives every open job toward a terminal status.
pub struct JobReconciler {
    ctx: PassContext,

    // Runtime state
    running: Arc<AtomicBool>,
    pass_lock: Arc<Mutex<()>>,
    passes_run: Arc<AtomicU64>,
    last_pass: Arc<RwLock<Option<PassSummary>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl JobReconciler {
    pub fn new(
        account_id: impl Into<String>,
        config: ReconcilerConfig,
        jobs: Arc<dyn JobStore>,
        records: Arc<dyn ObjectRecordStore>,
        batch: Arc<dyn BatchService>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            ctx: PassContext {
                account_id: account_id.into(),
                config,
                jobs,
                records,
                batch,
                publisher,
            },
            running: Arc::new(AtomicBool::new(false)),
            pass_lock: Arc::new(Mutex::new(())),
            passes_run: Arc::new(AtomicU64::new(0)),
            last_pass: Arc::new(RwLock::new(None)),
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.ctx.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start the background loops.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Reconciler already running");
            return;
        }

        info!(
            poll_interval_ms = self.ctx.config.poll_interval_ms,
            deadline_days = self.ctx.config.job_deadline_days,
            "Starting job reconciler"
        );

        self.spawn_reconcile_loop();
        self.spawn_sweep_loop();
    }

    /// Stop the background loops. A pass in progress finishes.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Reconciler not running");
            return;
        }

        info!("Stopping job reconciler");
        let _ = self.shutdown_tx.send(());

        // Let a pass in progress finish before reporting stopped
        let _guard = self.pass_lock.lock().await;
        info!("Job reconciler stopped");
    }

    /// Run one pass now.
    pub async fn run_pass(&self) -> PassSummary {
        Self::locked_pass(&self.ctx, &self.pass_lock, &self.passes_run, &self.last_pass).await
    }

    /// Remove object records past their expiry.
    pub fn sweep_expired(&self) -> Result<u64, StoreError> {
        Self::sweep(&self.ctx.records)
    }

    pub async fn status(&self) -> ReconcilerStatus {
        let open_jobs = match self.ctx.jobs.count() {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(error = %e, "Failed to count open jobs");
                None
            }
        };

        ReconcilerStatus {
            running: self.is_running(),
            poll_interval_ms: self.ctx.config.poll_interval_ms,
            passes_run: self.passes_run.load(Ordering::Relaxed),
            open_jobs,
            last_pass: self.last_pass.read().await.clone(),
        }
    }

    async fn locked_pass(
        ctx: &PassContext,
        pass_lock: &Mutex<()>,
        passes_run: &AtomicU64,
        last_pass: &RwLock<Option<PassSummary>>,
    ) -> PassSummary {
        let _guard = pass_lock.lock().await;
        let summary = ctx.run(Utc::now()).await;
        passes_run.fetch_add(1, Ordering::Relaxed);
        *last_pass.write().await = Some(summary.clone());
        summary
    }

    fn sweep(records: &Arc<dyn ObjectRecordStore>) -> Result<u64, StoreError> {
        let purged = records.purge_expired(Utc::now())?;
        metrics::EXPIRED_RECORDS_PURGED.inc_by(purged);
        if purged > 0 {
            info!(purged, "Removed expired object records");
        } else {
            debug!("No expired object records");
        }
        Ok(purged)
    }

    fn spawn_reconcile_loop(&self) {
        let running = Arc::clone(&self.running);
        let ctx = self.ctx.clone();
        let pass_lock = Arc::clone(&self.pass_lock);
        let passes_run = Arc::clone(&self.passes_run);
        let last_pass = Arc::clone(&self.last_pass);
        let interval = Duration::from_millis(self.ctx.config.poll_interval_ms);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Reconcile loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Reconcile loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        Self::locked_pass(&ctx, &pass_lock, &passes_run, &last_pass).await;
                    }
                }
            }
            info!("Reconcile loop stopped");
        });
    }

    fn spawn_sweep_loop(&self) {
        let running = Arc::clone(&self.running);
        let records = Arc::clone(&self.ctx.records);
        let interval = Duration::from_millis(self.ctx.config.expiry_sweep_interval_ms);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Expiry sweep loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Expiry sweep loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        if let Err(e) = Self::sweep(&records) {
                            warn!(error = %e, "Expiry sweep failed");
                        }
                    }
                }
            }
            info!("Expiry sweep loop stopped");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    use crate::batch::BatchJobStatus;
    use crate::job::{Job, ObjectRecord, SqliteJobStore, SqliteObjectRecordStore};
    use crate::testing::{MockBatchService, MockPublisher};

    struct Harness {
        reconciler: JobReconciler,
        jobs: Arc<SqliteJobStore>,
        records: Arc<SqliteObjectRecordStore>,
        batch: Arc<MockBatchService>,
        publisher: Arc<MockPublisher>,
    }

    fn harness(config: ReconcilerConfig) -> Harness {
        let jobs = Arc::new(SqliteJobStore::in_memory().unwrap());
        let records = Arc::new(SqliteObjectRecordStore::in_memory().unwrap());
        let batch = Arc::new(MockBatchService::new());
        let publisher = Arc::new(MockPublisher::new());
        let reconciler = JobReconciler::new(
            "111122223333",
            config,
            jobs.clone(),
            records.clone(),
            batch.clone(),
            publisher.clone(),
        );
        Harness {
            reconciler,
            jobs,
            records,
            batch,
            publisher,
        }
    }

    #[tokio::test]
    async fn test_run_pass_updates_status() {
        let h = harness(ReconcilerConfig::default());
        h.jobs.create(&Job::new("job-1", "batch-1", 0)).unwrap();
        h.batch.set_status("batch-1", BatchJobStatus::Complete, None).await;

        let before = h.reconciler.status().await;
        assert_eq!(before.passes_run, 0);
        assert_eq!(before.open_jobs, Some(1));
        assert!(before.last_pass.is_none());

        let summary = h.reconciler.run_pass().await;
        assert_eq!(summary.cancelled, 1);

        let after = h.reconciler.status().await;
        assert_eq!(after.passes_run, 1);
        assert_eq!(after.open_jobs, Some(0));
        assert_eq!(after.last_pass.unwrap().cancelled, 1);
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let h = harness(ReconcilerConfig {
            poll_interval_ms: 20,
            expiry_sweep_interval_ms: 20,
            ..ReconcilerConfig::default()
        });
        h.jobs.create(&Job::new("job-1", "batch-1", 0)).unwrap();
        h.batch.set_status("batch-1", BatchJobStatus::Complete, None).await;

        h.reconciler.start().await;
        assert!(h.reconciler.is_running());

        tokio::time::sleep(Duration::from_millis(200)).await;
        h.reconciler.stop().await;

        assert!(!h.reconciler.is_running());
        assert!(h.jobs.get("job-1").unwrap().is_none());
        assert_eq!(h.publisher.published().await.len(), 1);
        assert!(h.reconciler.status().await.passes_run >= 1);
    }

    #[tokio::test]
    async fn test_double_start_is_harmless() {
        let h = harness(ReconcilerConfig::default());
        h.reconciler.start().await;
        h.reconciler.start().await;
        assert!(h.reconciler.is_running());
        h.reconciler.stop().await;
        h.reconciler.stop().await;
        assert!(!h.reconciler.is_running());
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let h = harness(ReconcilerConfig::default());
        let now = chrono::Utc::now();
        h.records
            .put_batch(&[
                ObjectRecord::pending("bucketA", "old", "job-1", now - ChronoDuration::days(8)),
                ObjectRecord::pending("bucketA", "new", "job-1", now),
            ])
            .unwrap();

        assert_eq!(h.reconciler.sweep_expired().unwrap(), 1);
        assert_eq!(h.records.count_by_job("job-1", false).unwrap(), 1);
    }
}
