use std::sync::Arc;

use bulkrestore_core::{
    BatchService, CompletionListener, Config, JobIntake, JobReconciler, JobStore,
    NotificationPublisher, ObjectRecordStore, ObjectStorage, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    jobs: Arc<dyn JobStore>,
    records: Arc<dyn ObjectRecordStore>,
    intake: JobIntake,
    listener: CompletionListener,
    reconciler: Arc<JobReconciler>,
}

impl AppState {
    pub fn new(
        config: Config,
        jobs: Arc<dyn JobStore>,
        records: Arc<dyn ObjectRecordStore>,
        storage: Arc<dyn ObjectStorage>,
        batch: Arc<dyn BatchService>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        let intake = JobIntake::new(
            config.account.id.clone(),
            config.intake.clone(),
            config.notifications.topic.clone(),
            storage,
            Arc::clone(&batch),
            Arc::clone(&jobs),
            Arc::clone(&records),
        );
        let listener = CompletionListener::new(Arc::clone(&records));
        let reconciler = Arc::new(JobReconciler::new(
            config.account.id.clone(),
            config.reconciler.clone(),
            Arc::clone(&jobs),
            Arc::clone(&records),
            batch,
            publisher,
        ));

        Self {
            config,
            jobs,
            records,
            intake,
            listener,
            reconciler,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn jobs(&self) -> &dyn JobStore {
        self.jobs.as_ref()
    }

    pub fn records(&self) -> &dyn ObjectRecordStore {
        self.records.as_ref()
    }

    pub fn intake(&self) -> &JobIntake {
        &self.intake
    }

    pub fn listener(&self) -> &CompletionListener {
        &self.listener
    }

    pub fn reconciler(&self) -> &Arc<JobReconciler> {
        &self.reconciler
    }
}
