//! HTTP client for the bulk operation service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::BatchConfig;

use super::{
    BatchError, BatchJobDescription, BatchJobStatus, BatchService, CreateBatchJobRequest,
    SubmittedBatchJob,
};

/// Bulk operation service reached over HTTP.
///
/// `POST {endpoint}/accounts/{account}/jobs` creates an operation,
/// `GET {endpoint}/accounts/{account}/jobs/{id}` describes one.
pub struct HttpBatchService {
    client: Client,
    config: BatchConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeJobResponse {
    job: DescribedJob,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribedJob {
    status: BatchJobStatus,
    #[serde(default)]
    progress_summary: Option<ProgressSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProgressSummary {
    #[serde(default)]
    number_of_tasks_failed: Option<u64>,
}

impl HttpBatchService {
    pub fn new(config: BatchConfig) -> Result<Self, BatchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| BatchError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.endpoint.trim_end_matches('/')
    }

    fn jobs_url(&self, account_id: &str) -> String {
        format!("{}/accounts/{}/jobs", self.base_url(), account_id)
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BatchError> {
        self.with_auth(request).send().await.map_err(|e| {
            if e.is_timeout() {
                BatchError::Timeout
            } else if e.is_connect() {
                BatchError::ConnectionFailed(e.to_string())
            } else {
                BatchError::ApiError(e.to_string())
            }
        })
    }

    async fn error_from(response: Response) -> BatchError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        BatchError::ApiError(format!(
            "HTTP {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        ))
    }
}

#[async_trait]
impl BatchService for HttpBatchService {
    async fn submit(
        &self,
        request: &CreateBatchJobRequest,
    ) -> Result<SubmittedBatchJob, BatchError> {
        let url = self.jobs_url(&request.account_id);
        debug!(url = %url, token = %request.client_request_token, "Submitting bulk restore");

        let response = self.send(self.client.post(&url).json(request)).await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        response
            .json::<SubmittedBatchJob>()
            .await
            .map_err(|e| BatchError::InvalidResponse(e.to_string()))
    }

    async fn describe(
        &self,
        account_id: &str,
        batch_job_id: &str,
    ) -> Result<BatchJobDescription, BatchError> {
        let url = format!("{}/{}", self.jobs_url(account_id), batch_job_id);

        let response = self.send(self.client.get(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BatchError::JobNotFound(batch_job_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let described = response
            .json::<DescribeJobResponse>()
            .await
            .map_err(|e| BatchError::InvalidResponse(e.to_string()))?;

        Ok(BatchJobDescription {
            status: described.job.status,
            failed_task_count: described
                .job
                .progress_summary
                .and_then(|summary| summary.number_of_tasks_failed),
        })
    }
}
