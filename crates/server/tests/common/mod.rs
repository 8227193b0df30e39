//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock collaborators injected and SQLite stores in a temp directory.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use bulkrestore_core::{
    testing::{MockBatchService, MockObjectStorage, MockPublisher},
    SqliteJobStore, SqliteObjectRecordStore,
};
use bulkrestore_server::{create_router, AppState};

/// Re-export fixtures for test convenience
pub use bulkrestore_core::testing::fixtures;

/// Test fixture for API testing with mock collaborators.
///
/// Provides an in-process router with fully controllable mocks for:
/// - Object storage (MockObjectStorage)
/// - Bulk operations (MockBatchService)
/// - Notifications (MockPublisher)
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub state: Arc<AppState>,
    pub storage: Arc<MockObjectStorage>,
    pub batch: Arc<MockBatchService>,
    pub publisher: Arc<MockPublisher>,
    /// Holds the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut config = fixtures::config();
        config.database.path = db_path.clone();
        config.storage.root = temp_dir.path().join("objects");
        config.reconciler.enabled = false;

        let jobs = Arc::new(SqliteJobStore::new(&db_path).expect("Failed to create job store"));
        let records = Arc::new(
            SqliteObjectRecordStore::new(&db_path).expect("Failed to create record store"),
        );
        let storage = Arc::new(MockObjectStorage::new());
        let batch = Arc::new(MockBatchService::new());
        let publisher = Arc::new(MockPublisher::new());

        let state = Arc::new(AppState::new(
            config,
            jobs,
            records,
            storage.clone(),
            batch.clone(),
            publisher.clone(),
        ));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            storage,
            batch,
            publisher,
            temp_dir,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.post_raw(uri, body.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, body: impl Into<String>) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.into()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        TestResponse { status, body, text }
    }

    /// Stage a manifest and submit it through the API; returns the receipt.
    pub async fn submit_manifest(&self, key: &str, manifest: &str) -> Value {
        self.storage
            .put_object("manifests", key, manifest.as_bytes())
            .await;
        let response = self
            .post(
                "/api/v1/jobs",
                serde_json::to_value(fixtures::intake_request("manifests", key)).unwrap(),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "intake failed: {}", response.text);
        response.body
    }

    /// Deliver one completion event through the queue endpoint.
    pub async fn deliver(&self, bucket: &str, key: &str) -> TestResponse {
        self.post(
            "/api/v1/events",
            serde_json::json!({
                "Records": [{
                    "messageId": format!("{}/{}", bucket, key),
                    "body": fixtures::restore_completed_event(bucket, key),
                }]
            }),
        )
        .await
    }
}
