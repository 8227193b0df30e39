use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bulkrestore_core::{
    create_publisher, load_config, validate_config, BatchService, FsObjectStorage,
    HttpBatchService, JobStore, NotificationPublisher, ObjectRecordStore, ObjectStorage,
    SqliteJobStore, SqliteObjectRecordStore,
};
use bulkrestore_server::{create_router, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("BULKRESTORE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Account: {}", config.account.id);
    info!("Database path: {:?}", config.database.path);

    // Create SQLite table stores
    let jobs: Arc<dyn JobStore> = Arc::new(
        SqliteJobStore::new(&config.database.path).context("Failed to create job store")?,
    );
    let records: Arc<dyn ObjectRecordStore> = Arc::new(
        SqliteObjectRecordStore::new(&config.database.path)
            .context("Failed to create object record store")?,
    );
    info!("Job and object record stores initialized");

    // Object storage rooted on the local filesystem
    let storage: Arc<dyn ObjectStorage> = Arc::new(FsObjectStorage::new(&config.storage.root));
    info!("Object storage rooted at {:?}", config.storage.root);

    // Bulk operation service
    let batch: Arc<dyn BatchService> = Arc::new(
        HttpBatchService::new(config.batch.clone())
            .context("Failed to create bulk operation client")?,
    );
    info!("Bulk operation service at {}", config.batch.endpoint);

    // Notification publisher
    let publisher: Arc<dyn NotificationPublisher> = Arc::from(
        create_publisher(&config.notifications).context("Failed to create publisher")?,
    );
    info!("Using notification publisher: {}", publisher.name());

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        jobs,
        records,
        storage,
        batch,
        publisher,
    ));

    // Start reconciler if enabled
    let reconciler = Arc::clone(state.reconciler());
    if config.reconciler.enabled {
        reconciler.start().await;
        info!("Job reconciler started");
    } else {
        info!("Job reconciler disabled in config");
    }

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    if reconciler.is_running() {
        info!("Stopping reconciler...");
        reconciler.stop().await;
        info!("Reconciler stopped");
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
