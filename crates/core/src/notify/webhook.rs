//! Notification publishers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::NotificationsConfig;

use super::{JobNotification, NotificationPublisher, NotifyError};

/// POSTs each notification as JSON to a topic URL.
pub struct WebhookPublisher {
    client: Client,
    topic: String,
}

impl WebhookPublisher {
    pub fn new(topic: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::PublishFailed(e.to_string()))?;

        Ok(Self {
            client,
            topic: topic.into(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl NotificationPublisher for WebhookPublisher {
    async fn publish(&self, notification: &JobNotification) -> Result<(), NotifyError> {
        info!(
            job_id = %notification.job_id,
            status = %notification.status,
            progress = notification.progress_percent,
            "Publishing job notification"
        );

        let response = self
            .client
            .post(&self.topic)
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout
                } else {
                    NotifyError::PublishFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }

        debug!(job_id = %notification.job_id, "Notification delivered");
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

/// Logs notifications without delivering them; used when no topic is configured.
#[derive(Debug, Default)]
pub struct LogPublisher;

#[async_trait]
impl NotificationPublisher for LogPublisher {
    async fn publish(&self, notification: &JobNotification) -> Result<(), NotifyError> {
        info!(
            job_id = %notification.job_id,
            batch_job_id = %notification.batch_job_id,
            status = %notification.status,
            progress = notification.progress_percent,
            failed_files = notification.failed_batch_files,
            "Job notification (no topic configured)"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Build the publisher the notification config asks for.
pub fn create_publisher(
    config: &NotificationsConfig,
) -> Result<Box<dyn NotificationPublisher>, NotifyError> {
    match config.topic.as_deref().filter(|t| !t.is_empty()) {
        Some(topic) => Ok(Box::new(WebhookPublisher::new(
            topic,
            Duration::from_secs(config.timeout_secs as u64),
        )?)),
        None => Ok(Box::new(LogPublisher)),
    }
}
