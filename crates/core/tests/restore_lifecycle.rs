//! Restore lifecycle integration tests.
//!
//! These tests drive a job through intake, completion events and reconcile
//! passes against on-disk SQLite stores:
//! intake -> (unreconciled) -> Restoring -> Complete | Cancelled | Failed | Timeout

use std::sync::Arc;

use chrono::Duration;
use tempfile::TempDir;

use bulkrestore_core::{
    testing::{fixtures, MockBatchService, MockObjectStorage, MockPublisher},
    BatchJobStatus, CompletionListener, JobIntake, JobReconciler, JobStatus, JobStore,
    ObjectRecordStore, QueueBatch, QueueMessage, ReconcilerConfig, SqliteJobStore,
    SqliteObjectRecordStore,
};

/// Test helper wiring intake, listener and reconciler to shared stores.
struct TestHarness {
    jobs: Arc<SqliteJobStore>,
    records: Arc<SqliteObjectRecordStore>,
    storage: Arc<MockObjectStorage>,
    batch: Arc<MockBatchService>,
    publisher: Arc<MockPublisher>,
    intake: JobIntake,
    listener: CompletionListener,
    reconciler: JobReconciler,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("restore.db");

        let jobs = Arc::new(SqliteJobStore::new(&db_path).expect("Failed to create job store"));
        let records = Arc::new(
            SqliteObjectRecordStore::new(&db_path).expect("Failed to create record store"),
        );
        let storage = Arc::new(MockObjectStorage::new());
        let batch = Arc::new(MockBatchService::new());
        let publisher = Arc::new(MockPublisher::new());

        let intake = JobIntake::new(
            fixtures::ACCOUNT_ID,
            fixtures::intake_config(),
            None,
            storage.clone(),
            batch.clone(),
            jobs.clone(),
            records.clone(),
        );
        let listener = CompletionListener::new(records.clone());
        let reconciler = JobReconciler::new(
            fixtures::ACCOUNT_ID,
            ReconcilerConfig::default(),
            jobs.clone(),
            records.clone(),
            batch.clone(),
            publisher.clone(),
        );

        Self {
            jobs,
            records,
            storage,
            batch,
            publisher,
            intake,
            listener,
            reconciler,
            _temp_dir: temp_dir,
        }
    }

    /// Stage a manifest and run intake; returns (job id, batch job id).
    async fn submit(&self, manifest: &str) -> (String, String) {
        self.storage
            .put_object("manifests", "list.csv", manifest.as_bytes())
            .await;
        let receipt = self
            .intake
            .submit(&fixtures::intake_request("manifests", "list.csv"))
            .await
            .expect("intake failed");
        (receipt.bulk_job_id, receipt.batch_operation.job_id)
    }

    fn deliver(&self, bucket: &str, key: &str) {
        let batch = QueueBatch {
            records: vec![QueueMessage {
                message_id: format!("{}/{}", bucket, key),
                body: fixtures::restore_completed_event(bucket, key),
            }],
        };
        let report = self.listener.handle_batch(&batch);
        assert!(!report.has_rejections());
    }
}

#[tokio::test]
async fn test_two_object_manifest_end_to_end() {
    let h = TestHarness::new();
    let (job_id, batch_job_id) = h.submit("bucketA,obj1\nbucketA,obj2").await;

    let job = h.jobs.get(&job_id).unwrap().unwrap();
    assert_eq!(job.total_files, 2);
    assert_eq!(h.records.count_by_job(&job_id, false).unwrap(), 2);
    assert_eq!(h.batch.submissions().await.len(), 1);

    // Bulk operation still running: nothing happens
    h.reconciler.run_pass().await;
    assert!(h.jobs.get(&job_id).unwrap().unwrap().status.is_none());

    h.batch
        .set_status(&batch_job_id, BatchJobStatus::Complete, Some(0))
        .await;
    h.deliver("bucketA", "obj1");
    assert!(h.records.get("bucketA", "obj1").unwrap().unwrap().restored);

    // pending 1, done 1: progress rounds to 0, same as persisted
    h.reconciler.run_pass().await;
    let job = h.jobs.get(&job_id).unwrap().unwrap();
    assert_eq!(job.status, Some(JobStatus::Restoring));
    assert_eq!(job.progress_percent, Some(0));
    assert!(h.publisher.published().await.is_empty());

    h.deliver("bucketA", "obj2");
    let summary = h.reconciler.run_pass().await;
    assert_eq!(summary.completed, 1);
    assert!(h.jobs.get(&job_id).unwrap().is_none());

    let published = h.publisher.published().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].job_id, job_id);
    assert_eq!(published[0].status, JobStatus::Complete);
    assert_eq!(published[0].progress_percent, 100);

    // Job is gone; later passes stay silent
    h.reconciler.run_pass().await;
    assert_eq!(h.publisher.published().await.len(), 1);
}

#[tokio::test]
async fn test_duplicate_completion_events() {
    let h = TestHarness::new();
    let (job_id, _) = h.submit("bucketA,obj1\nbucketA,obj2\nbucketA,obj3").await;

    h.deliver("bucketA", "obj1");
    h.deliver("bucketA", "obj1");
    h.deliver("bucketA", "obj1");

    assert_eq!(h.records.count_by_job(&job_id, true).unwrap(), 1);
    assert_eq!(h.records.count_by_job(&job_id, false).unwrap(), 2);
}

#[tokio::test]
async fn test_empty_manifest_is_cancelled_without_restoring_notification() {
    let h = TestHarness::new();
    let (job_id, batch_job_id) = h.submit("").await;
    h.batch
        .set_status(&batch_job_id, BatchJobStatus::Complete, None)
        .await;

    h.reconciler.run_pass().await;

    assert!(h.jobs.get(&job_id).unwrap().is_none());
    let published = h.publisher.published().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].status, JobStatus::Cancelled);
    assert_eq!(published[0].progress_percent, 0);
}

#[tokio::test]
async fn test_failed_bulk_operation_reports_failed_count() {
    let h = TestHarness::new();
    let (job_id, batch_job_id) = h.submit("bucketA,obj1\nbucketB,obj2").await;
    h.batch
        .set_status(&batch_job_id, BatchJobStatus::Failed, Some(2))
        .await;

    h.reconciler.run_pass().await;

    assert!(h.jobs.get(&job_id).unwrap().is_none());
    let published = h.publisher.published().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].status, JobStatus::Failed);
    assert_eq!(published[0].failed_batch_files, 2);
}

#[tokio::test]
async fn test_progress_is_monotonic_across_passes() {
    let h = TestHarness::new();
    let manifest: Vec<String> = (0..10).map(|i| format!("bucketA,obj{}", i)).collect();
    let (job_id, batch_job_id) = h.submit(&manifest.join("\n")).await;
    h.batch
        .set_status(&batch_job_id, BatchJobStatus::Complete, None)
        .await;

    let mut last = 0;
    for i in 0..9 {
        h.deliver("bucketA", &format!("obj{}", i));
        h.reconciler.run_pass().await;
        let progress = h
            .jobs
            .get(&job_id)
            .unwrap()
            .unwrap()
            .progress_percent
            .unwrap();
        assert!(progress >= last);
        last = progress;
    }

    h.deliver("bucketA", "obj9");
    h.reconciler.run_pass().await;
    assert!(h.jobs.get(&job_id).unwrap().is_none());

    let statuses: Vec<JobStatus> = h
        .publisher
        .published()
        .await
        .into_iter()
        .map(|n| n.status)
        .collect();
    assert_eq!(statuses.last(), Some(&JobStatus::Complete));
    assert!(statuses[..statuses.len() - 1]
        .iter()
        .all(|s| *s == JobStatus::Restoring));
}

#[tokio::test]
async fn test_stale_job_times_out() {
    let h = TestHarness::new();
    h.jobs
        .create(&fixtures::job_aged(
            "job-stale",
            "batch-stale",
            1,
            Duration::days(6),
        ))
        .unwrap();

    let summary = h.reconciler.run_pass().await;

    assert_eq!(summary.timed_out, 1);
    assert!(h.jobs.get("job-stale").unwrap().is_none());
    let published = h.publisher.published().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].status, JobStatus::Timeout);
}

#[tokio::test]
async fn test_jobs_are_reconciled_independently() {
    let h = TestHarness::new();
    h.storage
        .put_object("manifests", "a.csv", b"bucketA,a1")
        .await;
    h.storage
        .put_object("manifests", "b.csv", b"bucketB,b1\nbucketB,b2")
        .await;

    let first = h
        .intake
        .submit(&fixtures::intake_request("manifests", "a.csv"))
        .await
        .unwrap();
    let second = h
        .intake
        .submit(&fixtures::intake_request("manifests", "b.csv"))
        .await
        .unwrap();

    h.batch
        .set_status(&first.batch_operation.job_id, BatchJobStatus::Complete, None)
        .await;
    h.batch
        .set_status(&second.batch_operation.job_id, BatchJobStatus::Cancelled, None)
        .await;
    h.deliver("bucketA", "a1");

    let summary = h.reconciler.run_pass().await;

    assert_eq!(summary.jobs_seen, 2);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.cancelled, 1);
    assert!(h.jobs.get(&first.bulk_job_id).unwrap().is_none());
    assert!(h.jobs.get(&second.bulk_job_id).unwrap().is_none());
}
