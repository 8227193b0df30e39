//! Mock object storage for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::storage::{NotificationConfig, ObjectStorage, StorageError};

/// In-memory implementation of the ObjectStorage trait.
///
/// - Objects are staged with `put_object`
/// - Subscriptions are recorded in call order for assertions
/// - Subscription writes can be made to fail
#[derive(Debug, Default)]
pub struct MockObjectStorage {
    objects: Arc<RwLock<HashMap<(String, String), Vec<u8>>>>,
    subscriptions: Arc<RwLock<Vec<(String, NotificationConfig)>>>,
    fail_subscriptions: AtomicBool,
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an object.
    pub async fn put_object(&self, bucket: &str, key: &str, data: &[u8]) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
    }

    /// Recorded `put_notification_config` calls.
    pub async fn subscriptions(&self) -> Vec<(String, NotificationConfig)> {
        self.subscriptions.read().await.clone()
    }

    pub fn fail_subscriptions(&self, fail: bool) {
        self.fail_subscriptions.store(fail, Ordering::SeqCst);
    }

    async fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

#[async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<String, StorageError> {
        let data = self.read(bucket, key).await?;
        Ok(format!("\"{:x}\"", md5::compute(&data)))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.read(bucket, key).await
    }

    async fn put_notification_config(
        &self,
        bucket: &str,
        config: &NotificationConfig,
    ) -> Result<(), StorageError> {
        if self.fail_subscriptions.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("mock: subscription denied for {}", bucket),
            )));
        }
        self.subscriptions
            .write()
            .await
            .push((bucket.to_string(), config.clone()));
        Ok(())
    }
}
