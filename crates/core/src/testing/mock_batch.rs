//! Mock bulk operation service for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::batch::{
    BatchError, BatchJobDescription, BatchJobStatus, BatchService, CreateBatchJobRequest,
    SubmittedBatchJob,
};

/// Mock implementation of the BatchService trait.
///
/// Provides controllable behavior for testing:
/// - Records every submission
/// - Resubmitting a token returns the original operation
/// - Operation status is set by the test (`Active` until then)
/// - Submissions and describes can be made to fail
///
/// # Example
///
/// ```rust,ignore
/// let batch = MockBatchService::new();
/// let submitted = batch.submit(&request).await?;
/// batch.set_status(&submitted.job_id, BatchJobStatus::Complete, None).await;
/// ```
#[derive(Debug, Default)]
pub struct MockBatchService {
    submissions: Arc<RwLock<Vec<CreateBatchJobRequest>>>,
    tokens: Arc<RwLock<HashMap<String, String>>>,
    descriptions: Arc<RwLock<HashMap<String, BatchJobDescription>>>,
    describe_calls: Arc<RwLock<Vec<String>>>,
    counter: AtomicU32,
    fail_submissions: AtomicBool,
    fail_describes: AtomicBool,
}

impl MockBatchService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded submissions, including resubmitted tokens.
    pub async fn submissions(&self) -> Vec<CreateBatchJobRequest> {
        self.submissions.read().await.clone()
    }

    /// Batch job IDs passed to `describe`, in call order.
    pub async fn describe_calls(&self) -> Vec<String> {
        self.describe_calls.read().await.clone()
    }

    /// Set what `describe` reports for an operation.
    pub async fn set_status(
        &self,
        batch_job_id: &str,
        status: BatchJobStatus,
        failed_task_count: Option<u64>,
    ) {
        self.descriptions.write().await.insert(
            batch_job_id.to_string(),
            BatchJobDescription {
                status,
                failed_task_count,
            },
        );
    }

    pub fn fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::SeqCst);
    }

    pub fn fail_describes(&self, fail: bool) {
        self.fail_describes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BatchService for MockBatchService {
    async fn submit(
        &self,
        request: &CreateBatchJobRequest,
    ) -> Result<SubmittedBatchJob, BatchError> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(BatchError::ApiError("mock: submission rejected".to_string()));
        }

        self.submissions.write().await.push(request.clone());

        let mut tokens = self.tokens.write().await;
        if let Some(existing) = tokens.get(&request.client_request_token) {
            return Ok(SubmittedBatchJob {
                job_id: existing.clone(),
            });
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let job_id = format!("batch-{:04}", n);
        tokens.insert(request.client_request_token.clone(), job_id.clone());
        self.descriptions.write().await.insert(
            job_id.clone(),
            BatchJobDescription {
                status: BatchJobStatus::Active,
                failed_task_count: None,
            },
        );

        Ok(SubmittedBatchJob { job_id })
    }

    async fn describe(
        &self,
        _account_id: &str,
        batch_job_id: &str,
    ) -> Result<BatchJobDescription, BatchError> {
        self.describe_calls
            .write()
            .await
            .push(batch_job_id.to_string());

        if self.fail_describes.load(Ordering::SeqCst) {
            return Err(BatchError::Timeout);
        }

        self.descriptions
            .read()
            .await
            .get(batch_job_id)
            .cloned()
            .ok_or_else(|| BatchError::JobNotFound(batch_job_id.to_string()))
    }
}
