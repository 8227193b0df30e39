//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external collaborator
//! traits, so intake, listener and reconciler can be exercised end to end
//! without real infrastructure. Table stores need no mock: use the SQLite
//! stores' `in_memory()` constructors.
//!
//! # Example
//!
//! ```rust,ignore
//! use bulkrestore_core::testing::{MockBatchService, MockObjectStorage, MockPublisher};
//!
//! let storage = MockObjectStorage::new();
//! storage.put_object("manifests", "list.csv", b"bucketA,obj1\n").await;
//!
//! let batch = MockBatchService::new();
//! batch.set_status("batch-0001", BatchJobStatus::Complete, None).await;
//! ```

mod mock_batch;
mod mock_publisher;
mod mock_storage;

pub use mock_batch::MockBatchService;
pub use mock_publisher::MockPublisher;
pub use mock_storage::MockObjectStorage;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{Duration, Utc};

    use crate::batch::RestoreTier;
    use crate::config::{
        AccountConfig, BatchConfig, Config, DatabaseConfig, IntakeConfig, NotificationsConfig,
        ServerConfig, StorageConfig,
    };
    use crate::intake::IntakeRequest;
    use crate::job::Job;
    use crate::reconciler::ReconcilerConfig;

    pub const ACCOUNT_ID: &str = "111122223333";

    /// Intake settings pointing at fake provider resources.
    pub fn intake_config() -> IntakeConfig {
        IntakeConfig {
            report_bucket_arn: "arn:aws:s3:::restore-reports".to_string(),
            role_arn: format!("arn:aws:iam::{}:role/bulk-restore", ACCOUNT_ID),
            notification_queue: format!("arn:aws:sqs:us-east-1:{}:restore-events", ACCOUNT_ID),
            topic_queue: Some(format!(
                "https://sqs.us-east-1.amazonaws.com/{}/restore-topic",
                ACCOUNT_ID
            )),
            priority: 10,
        }
    }

    /// A complete configuration with defaults for everything optional.
    pub fn config() -> Config {
        Config {
            account: AccountConfig {
                id: ACCOUNT_ID.to_string(),
            },
            intake: intake_config(),
            batch: BatchConfig {
                endpoint: "http://localhost:9300".to_string(),
                api_key: None,
                timeout_secs: 30,
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
            notifications: NotificationsConfig::default(),
            reconciler: ReconcilerConfig::default(),
        }
    }

    /// Bulk-tier restore of the manifest at `bucket/key`, kept for 3 days.
    pub fn intake_request(bucket: &str, key: &str) -> IntakeRequest {
        IntakeRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            tier: RestoreTier::Bulk,
            expiration_days: 3,
            client_tag: "nightly".to_string(),
        }
    }

    /// Unreconciled job created `age` ago.
    pub fn job_aged(id: &str, batch_job_id: &str, total_files: u64, age: Duration) -> Job {
        let mut job = Job::new(id, batch_job_id, total_files);
        job.created_at = Utc::now() - age;
        job
    }

    /// Completion event envelope for one object, as the storage service sends it.
    pub fn restore_completed_event(bucket: &str, key: &str) -> String {
        serde_json::json!({
            "Records": [{
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "eventName": "ObjectRestore:Completed",
                "s3": {
                    "bucket": { "name": bucket },
                    "object": { "key": key }
                }
            }]
        })
        .to_string()
    }
}
