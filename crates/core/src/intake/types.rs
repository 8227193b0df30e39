//! Intake request, receipt and error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::{BatchError, RestoreTier, SubmittedBatchJob};
use crate::job::StoreError;
use crate::storage::StorageError;

use super::ManifestError;

/// Errors that abort an intake. Effects already performed are not undone.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Batch submission failed: {0}")]
    Batch(#[from] BatchError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Restore request for every object listed in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeRequest {
    /// Bucket holding the manifest.
    pub bucket: String,
    /// Manifest key.
    pub key: String,
    pub tier: RestoreTier,
    /// How long restored copies stay retrievable.
    pub expiration_days: u32,
    pub client_tag: String,
}

/// Returned to the caller after a successful intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IntakeReceipt {
    pub notification_topic: Option<String>,
    pub notification_queue: Option<String>,
    /// Report bucket name (resource part of the configured ARN).
    pub report_bucket: String,
    /// Job ID.
    pub bulk_job_id: String,
    pub total_files_requested: u64,
    pub batch_operation: SubmittedBatchJob,
}

/// Bucket name from an `arn:aws:s3:::bucket` style ARN.
///
/// Anything that does not look like an ARN is returned unchanged.
pub fn bucket_name_from_arn(arn: &str) -> &str {
    if !arn.starts_with("arn:") {
        return arn;
    }
    let resource = arn.splitn(6, ':').nth(5).unwrap_or(arn);
    resource.split('/').next().unwrap_or(resource)
}
