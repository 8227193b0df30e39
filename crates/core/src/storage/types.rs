//! Object storage types and trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event name requested for restore-completed subscriptions.
pub const RESTORE_COMPLETED_EVENT: &str = "s3:ObjectRestore:Completed";

/// Errors from the object storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Event subscription attached to a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationConfig {
    pub queue_configurations: Vec<QueueConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueueConfiguration {
    pub id: String,
    pub queue_arn: String,
    pub events: Vec<String>,
}

impl NotificationConfig {
    /// Restore-completed events delivered to `queue`.
    pub fn restore_completed(queue: impl Into<String>) -> Self {
        Self {
            queue_configurations: vec![QueueConfiguration {
                id: "Notifications".to_string(),
                queue_arn: queue.into(),
                events: vec![RESTORE_COMPLETED_EVENT.to_string()],
            }],
        }
    }
}

/// Object storage the manifests and restored objects live in.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Current etag of an object.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<String, StorageError>;

    /// Full object contents.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Replace a bucket's event subscription.
    async fn put_notification_config(
        &self,
        bucket: &str,
        config: &NotificationConfig,
    ) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_completed_subscription_shape() {
        let config = NotificationConfig::restore_completed("arn:aws:sqs:restore-events");
        let json = serde_json::to_value(&config).unwrap();
        let queue = &json["QueueConfigurations"][0];
        assert_eq!(queue["Id"], "Notifications");
        assert_eq!(queue["QueueArn"], "arn:aws:sqs:restore-events");
        assert_eq!(queue["Events"][0], "s3:ObjectRestore:Completed");
    }
}
