//! Filesystem-backed object storage.
//!
//! Layout:
//!
//! ```text
//! {root}/{bucket}/{key}                  object data
//! {root}/.notifications/{bucket}.json    event subscription
//! ```

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{NotificationConfig, ObjectStorage, StorageError};

const NOTIFICATIONS_DIR: &str = ".notifications";

/// Object storage rooted at a local directory, one subdirectory per bucket.
pub struct FsObjectStorage {
    root: PathBuf,
}

impl FsObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `bucket/key`, rejecting anything that would escape the bucket.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        validate_segment(bucket)?;
        if key.is_empty() {
            return Err(StorageError::InvalidPath(format!("{}/", bucket)));
        }

        let key_path = Path::new(key);
        let only_normal = key_path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !only_normal {
            return Err(StorageError::InvalidPath(format!("{}/{}", bucket, key)));
        }

        Ok(self.root.join(bucket).join(key_path))
    }

    fn notification_path(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        validate_segment(bucket)?;
        Ok(self
            .root
            .join(NOTIFICATIONS_DIR)
            .join(format!("{}.json", bucket)))
    }

    /// Store an object. Used to stage manifests.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
    ) -> Result<String, StorageError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        Ok(etag_of(data))
    }

    /// Read back a bucket's subscription, if any.
    pub async fn notification_config(
        &self,
        bucket: &str,
    ) -> Result<Option<NotificationConfig>, StorageError> {
        let path = self.notification_path(bucket)?;
        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(bucket, key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_segment(bucket: &str) -> Result<(), StorageError> {
    if bucket.is_empty()
        || bucket.starts_with('.')
        || bucket.contains('/')
        || bucket.contains('\\')
    {
        return Err(StorageError::InvalidPath(bucket.to_string()));
    }
    Ok(())
}

/// Quoted hex MD5 of the contents.
fn etag_of(data: &[u8]) -> String {
    format!("\"{:x}\"", md5::compute(data))
}

#[async_trait]
impl ObjectStorage for FsObjectStorage {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<String, StorageError> {
        let data = self.read(bucket, key).await?;
        Ok(etag_of(&data))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.read(bucket, key).await
    }

    async fn put_notification_config(
        &self,
        bucket: &str,
        config: &NotificationConfig,
    ) -> Result<(), StorageError> {
        let path = self.notification_path(bucket)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(config)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&path, json).await?;

        debug!(bucket = %bucket, path = %path.display(), "Wrote bucket subscription");
        Ok(())
    }
}
