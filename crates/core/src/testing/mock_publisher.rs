//! Mock notification publisher for testing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::notify::{JobNotification, NotificationPublisher, NotifyError};

/// Records every notification; can be made to fail.
#[derive(Debug, Default)]
pub struct MockPublisher {
    published: Arc<RwLock<Vec<JobNotification>>>,
    fail: AtomicBool,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications accepted so far. Failed publishes are not recorded.
    pub async fn published(&self) -> Vec<JobNotification> {
        self.published.read().await.clone()
    }

    pub async fn clear(&self) {
        self.published.write().await.clear();
    }

    pub fn fail_publishes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationPublisher for MockPublisher {
    async fn publish(&self, notification: &JobNotification) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::PublishFailed("mock: topic unavailable".to_string()));
        }
        self.published.write().await.push(notification.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
