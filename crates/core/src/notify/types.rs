//! Job notification types.

use std::fmt::Display;

use async_trait::async_trait;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::job::JobStatus;

/// Errors from notification publishing.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Topic rejected notification: HTTP {0}")]
    Rejected(u16),

    #[error("Request timeout")]
    Timeout,
}

/// Status change of one job, as published downstream.
///
/// Counts are sent as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobNotification {
    pub job_id: String,
    pub batch_job_id: String,
    pub status: JobStatus,
    #[serde(serialize_with = "as_string")]
    pub progress_percent: u32,
    #[serde(serialize_with = "as_string")]
    pub failed_batch_files: u64,
}

fn as_string<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Downstream sink for job notifications.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, notification: &JobNotification) -> Result<(), NotifyError>;

    /// Short name for logs and metrics.
    fn name(&self) -> &str;
}
