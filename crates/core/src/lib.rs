pub mod batch;
pub mod config;
pub mod intake;
pub mod job;
pub mod listener;
pub mod metrics;
pub mod notify;
pub mod reconciler;
pub mod storage;
pub mod testing;

pub use batch::{
    BatchError, BatchJobDescription, BatchJobStatus, BatchService, CreateBatchJobRequest,
    HttpBatchService, RestoreTier, SubmittedBatchJob,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use intake::{IntakeError, IntakeReceipt, IntakeRequest, JobIntake, ManifestError};
pub use job::{
    Job, JobStatus, JobStore, ObjectRecord, ObjectRecordStore, SqliteJobStore,
    SqliteObjectRecordStore, StoreError,
};
pub use listener::{CompletionListener, ListenerReport, MessageOutcome, QueueBatch, QueueMessage};
pub use notify::{
    create_publisher, JobNotification, LogPublisher, NotificationPublisher, NotifyError,
    WebhookPublisher,
};
pub use reconciler::{JobReconciler, PassSummary, ReconcilerConfig, ReconcilerStatus};
pub use storage::{FsObjectStorage, NotificationConfig, ObjectStorage, StorageError};
