//! Job intake.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::batch::{
    BatchManifest, BatchOperation, BatchReport, BatchService, BatchTag, CreateBatchJobRequest,
    InitiateRestoreObject, ManifestLocation, ManifestSpec,
};
use crate::config::IntakeConfig;
use crate::job::{Job, JobStore, ObjectRecord, ObjectRecordStore};
use crate::metrics;
use crate::storage::{NotificationConfig, ObjectStorage};

use super::manifest::{distinct_buckets, parse_manifest};
use super::{bucket_name_from_arn, IntakeError, IntakeReceipt, IntakeRequest};

/// Turns a manifest into one bulk restore operation plus its tracking rows.
pub struct JobIntake {
    account_id: String,
    config: IntakeConfig,
    notification_topic: Option<String>,
    storage: Arc<dyn ObjectStorage>,
    batch: Arc<dyn BatchService>,
    jobs: Arc<dyn JobStore>,
    records: Arc<dyn ObjectRecordStore>,
}

impl JobIntake {
    pub fn new(
        account_id: impl Into<String>,
        config: IntakeConfig,
        notification_topic: Option<String>,
        storage: Arc<dyn ObjectStorage>,
        batch: Arc<dyn BatchService>,
        jobs: Arc<dyn JobStore>,
        records: Arc<dyn ObjectRecordStore>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            config,
            notification_topic,
            storage,
            batch,
            jobs,
            records,
        }
    }

    /// Submit a restore for every object in the manifest.
    pub async fn submit(&self, request: &IntakeRequest) -> Result<IntakeReceipt, IntakeError> {
        let result = self.run(request).await;
        match &result {
            Ok(receipt) => {
                metrics::INTAKE_SUBMISSIONS.with_label_values(&["success"]).inc();
                info!(
                    job_id = %receipt.bulk_job_id,
                    batch_job_id = %receipt.batch_operation.job_id,
                    files = receipt.total_files_requested,
                    "Restore job created"
                );
            }
            Err(e) => {
                metrics::INTAKE_SUBMISSIONS.with_label_values(&["failed"]).inc();
                error!(bucket = %request.bucket, key = %request.key, error = %e, "Intake failed");
            }
        }
        result
    }

    async fn run(&self, request: &IntakeRequest) -> Result<IntakeReceipt, IntakeError> {
        if request.bucket.is_empty() || request.key.is_empty() {
            return Err(IntakeError::InvalidRequest(
                "manifest bucket and key are required".to_string(),
            ));
        }

        let job_id = Uuid::new_v4().to_string();
        debug!(job_id = %job_id, bucket = %request.bucket, key = %request.key, "Starting intake");

        let body = self.storage.get_object(&request.bucket, &request.key).await?;
        let entries = parse_manifest(&body)?;

        self.subscribe_buckets(distinct_buckets(&entries)).await?;

        let etag = self.storage.head_object(&request.bucket, &request.key).await?;
        let batch_request = self.build_request(&job_id, request, etag);
        let submitted = self.batch.submit(&batch_request).await?;

        let now = Utc::now();
        let records: Vec<ObjectRecord> = entries
            .into_iter()
            .map(|entry| ObjectRecord::pending(entry.bucket, entry.key, job_id.as_str(), now))
            .collect();
        let total_files = records.len() as u64;

        // Records first, so the reconciler never counts a half-written job.
        self.records.put_batch(&records)?;
        metrics::OBJECTS_TRACKED.inc_by(total_files);

        self.jobs
            .create(&Job::new(job_id.as_str(), submitted.job_id.as_str(), total_files))?;

        Ok(IntakeReceipt {
            notification_topic: self.notification_topic.clone(),
            notification_queue: self.config.topic_queue.clone(),
            report_bucket: bucket_name_from_arn(&self.config.report_bucket_arn).to_string(),
            bulk_job_id: job_id,
            total_files_requested: total_files,
            batch_operation: submitted,
        })
    }

    async fn subscribe_buckets<'a>(
        &self,
        buckets: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), IntakeError> {
        let subscription = NotificationConfig::restore_completed(&self.config.notification_queue);
        for bucket in buckets {
            self.storage
                .put_notification_config(bucket, &subscription)
                .await?;
            debug!(bucket = %bucket, "Subscribed bucket to restore completions");
        }
        Ok(())
    }

    fn build_request(
        &self,
        job_id: &str,
        request: &IntakeRequest,
        etag: String,
    ) -> CreateBatchJobRequest {
        CreateBatchJobRequest {
            account_id: self.account_id.clone(),
            client_request_token: job_id.to_string(),
            confirmation_required: false,
            manifest: BatchManifest {
                spec: ManifestSpec::csv_bucket_key(),
                location: ManifestLocation::new(&request.bucket, &request.key, etag),
            },
            operation: BatchOperation {
                initiate_restore: InitiateRestoreObject {
                    expiration_in_days: request.expiration_days,
                    glacier_job_tier: request.tier,
                },
            },
            report: BatchReport::all_tasks(self.config.report_bucket_arn.as_str()),
            priority: self.config.priority,
            role_arn: self.config.role_arn.clone(),
            tags: vec![BatchTag {
                key: "client_tag".to_string(),
                value: request.client_tag.clone(),
            }],
        }
    }
}
