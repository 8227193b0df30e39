//! Types for bulk operation service calls.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Manifest format understood by the bulk operation service.
pub const MANIFEST_FORMAT_CSV: &str = "S3BatchOperations_CSV_20180820";

/// Completion report format.
pub const REPORT_FORMAT_CSV: &str = "Report_CSV_20180820";

/// Errors that can occur while talking to the bulk operation service.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Batch job not found: {0}")]
    JobNotFound(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Status reported by the bulk operation service.
///
/// Both spellings of the cancelled status are accepted on input. Statuses this
/// crate does not know are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BatchJobStatus {
    Active,
    Cancelled,
    Cancelling,
    Complete,
    Completing,
    Failed,
    Failing,
    New,
    Paused,
    Pausing,
    Preparing,
    Ready,
    Suspended,
    Unknown(String),
}

impl BatchJobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BatchJobStatus::Active => "Active",
            BatchJobStatus::Cancelled => "Cancelled",
            BatchJobStatus::Cancelling => "Cancelling",
            BatchJobStatus::Complete => "Complete",
            BatchJobStatus::Completing => "Completing",
            BatchJobStatus::Failed => "Failed",
            BatchJobStatus::Failing => "Failing",
            BatchJobStatus::New => "New",
            BatchJobStatus::Paused => "Paused",
            BatchJobStatus::Pausing => "Pausing",
            BatchJobStatus::Preparing => "Preparing",
            BatchJobStatus::Ready => "Ready",
            BatchJobStatus::Suspended => "Suspended",
            BatchJobStatus::Unknown(s) => s,
        }
    }

    /// Whether the bulk operation will not change status again.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            BatchJobStatus::Complete | BatchJobStatus::Failed | BatchJobStatus::Cancelled
        )
    }
}

impl fmt::Display for BatchJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchJobStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Active" => BatchJobStatus::Active,
            "Cancelled" | "Canceled" => BatchJobStatus::Cancelled,
            "Cancelling" | "Canceling" => BatchJobStatus::Cancelling,
            "Complete" => BatchJobStatus::Complete,
            "Completing" => BatchJobStatus::Completing,
            "Failed" => BatchJobStatus::Failed,
            "Failing" => BatchJobStatus::Failing,
            "New" => BatchJobStatus::New,
            "Paused" => BatchJobStatus::Paused,
            "Pausing" => BatchJobStatus::Pausing,
            "Preparing" => BatchJobStatus::Preparing,
            "Ready" => BatchJobStatus::Ready,
            "Suspended" => BatchJobStatus::Suspended,
            other => BatchJobStatus::Unknown(other.to_string()),
        })
    }
}

impl From<String> for BatchJobStatus {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<BatchJobStatus> for String {
    fn from(status: BatchJobStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Retrieval tier the restore runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RestoreTier {
    Standard,
    Bulk,
}

/// Request to create one bulk restore operation over a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateBatchJobRequest {
    pub account_id: String,
    /// Idempotency token; resubmitting the same token is a no-op.
    pub client_request_token: String,
    pub confirmation_required: bool,
    pub manifest: BatchManifest,
    pub operation: BatchOperation,
    pub report: BatchReport,
    pub priority: i32,
    pub role_arn: String,
    pub tags: Vec<BatchTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchManifest {
    pub spec: ManifestSpec,
    pub location: ManifestLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestSpec {
    pub format: String,
    pub fields: Vec<String>,
}

impl ManifestSpec {
    /// `bucket,key` CSV manifest.
    pub fn csv_bucket_key() -> Self {
        Self {
            format: MANIFEST_FORMAT_CSV.to_string(),
            fields: vec!["Bucket".to_string(), "Key".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestLocation {
    pub object_arn: String,
    /// Manifest etag at submission time, lets the provider detect tampering.
    #[serde(rename = "ETag")]
    pub etag: String,
}

impl ManifestLocation {
    pub fn new(bucket: &str, key: &str, etag: impl Into<String>) -> Self {
        Self {
            object_arn: format!("arn:aws:s3:::{}/{}", bucket, key),
            etag: etag.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOperation {
    #[serde(rename = "S3InitiateRestoreObject")]
    pub initiate_restore: InitiateRestoreObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitiateRestoreObject {
    pub expiration_in_days: u32,
    pub glacier_job_tier: RestoreTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchReport {
    /// Report bucket ARN.
    pub bucket: String,
    pub format: String,
    pub enabled: bool,
    pub report_scope: String,
}

impl BatchReport {
    /// CSV report covering every task.
    pub fn all_tasks(bucket_arn: impl Into<String>) -> Self {
        Self {
            bucket: bucket_arn.into(),
            format: REPORT_FORMAT_CSV.to_string(),
            enabled: true,
            report_scope: "AllTasks".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchTag {
    pub key: String,
    pub value: String,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedBatchJob {
    #[serde(rename = "JobId")]
    pub job_id: String,
}

/// Coarse status of a bulk operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJobDescription {
    pub status: BatchJobStatus,
    /// Only present once the provider has a progress summary.
    pub failed_task_count: Option<u64>,
}

/// Bulk operation service.
#[async_trait]
pub trait BatchService: Send + Sync {
    /// Create a bulk operation.
    async fn submit(
        &self,
        request: &CreateBatchJobRequest,
    ) -> Result<SubmittedBatchJob, BatchError>;

    /// Poll a bulk operation's status.
    async fn describe(
        &self,
        account_id: &str,
        batch_job_id: &str,
    ) -> Result<BatchJobDescription, BatchError>;
}
