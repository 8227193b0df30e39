//! Completion event delivery tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestFixture;

#[tokio::test]
async fn test_completion_event_marks_object_restored() {
    let fixture = TestFixture::new();
    let receipt = fixture
        .submit_manifest("list.csv", "bucketA,obj1\nbucketA,obj2")
        .await;
    let job_id = receipt["BulkJobId"].as_str().unwrap();

    let response = fixture.deliver("bucketA", "obj1").await;

    assert_eq!(response.status, StatusCode::OK);
    let message = &response.body["messages"][0];
    assert_eq!(message["message_id"], "bucketA/obj1");
    assert_eq!(message["outcome"], "processed");
    assert_eq!(message["marked"], 1);
    assert_eq!(message["untracked"], 0);

    let job = fixture.get(&format!("/api/v1/jobs/{}", job_id)).await;
    assert_eq!(job.body["restored_files"], 1);
}

#[tokio::test]
async fn test_duplicate_events_are_idempotent() {
    let fixture = TestFixture::new();
    let receipt = fixture.submit_manifest("list.csv", "bucketA,obj1").await;
    let job_id = receipt["BulkJobId"].as_str().unwrap();

    for _ in 0..3 {
        let response = fixture.deliver("bucketA", "obj1").await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let job = fixture.get(&format!("/api/v1/jobs/{}", job_id)).await;
    assert_eq!(job.body["restored_files"], 1);
    assert_eq!(job.body["pending_files"], 0);
}

#[tokio::test]
async fn test_event_for_untracked_object_is_accepted() {
    let fixture = TestFixture::new();

    let response = fixture.deliver("bucketZ", "stray").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["messages"][0]["untracked"], 1);
}

#[tokio::test]
async fn test_non_json_message_body_is_400() {
    let fixture = TestFixture::new();
    fixture.submit_manifest("list.csv", "bucketA,obj1").await;

    let response = fixture
        .post(
            "/api/v1/events",
            json!({
                "Records": [
                    { "messageId": "good", "body": common::fixtures::restore_completed_event("bucketA", "obj1") },
                    { "messageId": "bad", "body": "not json at all" }
                ]
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let messages = response.body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["outcome"], "processed");
    assert_eq!(messages[1]["outcome"], "rejected");
}

#[tokio::test]
async fn test_message_without_records_is_ignored() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/api/v1/events",
            json!({ "Records": [{ "messageId": "test-event", "body": "{\"Event\":\"s3:TestEvent\"}" }] }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["messages"][0]["outcome"], "ignored");
}
