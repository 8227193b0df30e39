//! Object completion listener.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::job::ObjectRecordStore;
use crate::metrics;

use super::types::EventEnvelope;
use super::{ListenerReport, MessageOutcome, MessageReport, QueueBatch, QueueMessage};

/// Marks object records restored as completion events arrive.
pub struct CompletionListener {
    records: Arc<dyn ObjectRecordStore>,
}

impl CompletionListener {
    pub fn new(records: Arc<dyn ObjectRecordStore>) -> Self {
        Self { records }
    }

    /// Handle every message of a delivery. One bad message does not stop the rest.
    pub fn handle_batch(&self, batch: &QueueBatch) -> ListenerReport {
        let messages = batch
            .records
            .iter()
            .map(|message| {
                let outcome = self.handle_message(message);
                metrics::LISTENER_MESSAGES
                    .with_label_values(&[outcome.label()])
                    .inc();
                MessageReport {
                    message_id: message.message_id.clone(),
                    outcome,
                }
            })
            .collect();

        ListenerReport { messages }
    }

    /// Handle one message.
    pub fn handle_message(&self, message: &QueueMessage) -> MessageOutcome {
        let envelope: EventEnvelope = match serde_json::from_str(&message.body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(message_id = %message.message_id, error = %e, "Unreadable event body");
                return MessageOutcome::Rejected {
                    reason: format!("invalid event body: {}", e),
                };
            }
        };

        let Some(records) = envelope.records else {
            debug!(message_id = %message.message_id, "Event without records ignored");
            return MessageOutcome::Ignored;
        };

        let completions: Vec<_> = records
            .iter()
            .filter(|record| record.is_restore_completed())
            .collect();
        if completions.is_empty() {
            return MessageOutcome::Ignored;
        }

        // Validate the whole message before touching the store
        let mut locations = Vec::with_capacity(completions.len());
        for record in &completions {
            match record.location() {
                Some(location) => locations.push(location),
                None => {
                    warn!(message_id = %message.message_id, "Completion event without bucket or key");
                    return MessageOutcome::Rejected {
                        reason: "bucket or key is empty".to_string(),
                    };
                }
            }
        }

        let mut marked = 0;
        let mut untracked = 0;
        for (bucket, key) in locations {
            match self.records.mark_restored(bucket, key) {
                Ok(true) => {
                    info!(bucket = %bucket, key = %key, "Object restored");
                    marked += 1;
                }
                Ok(false) => {
                    info!(bucket = %bucket, key = %key, "Restore completed for untracked object");
                    untracked += 1;
                }
                Err(e) => {
                    warn!(bucket = %bucket, key = %key, error = %e, "Failed to mark object restored");
                    return MessageOutcome::Failed {
                        reason: e.to_string(),
                    };
                }
            }
        }

        MessageOutcome::Processed { marked, untracked }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::job::{ObjectRecord, SqliteObjectRecordStore};
    use crate::testing::fixtures::restore_completed_event;

    fn listener_with(keys: &[&str]) -> (CompletionListener, Arc<SqliteObjectRecordStore>) {
        let store = Arc::new(SqliteObjectRecordStore::in_memory().unwrap());
        let records: Vec<ObjectRecord> = keys
            .iter()
            .map(|key| ObjectRecord::pending("bucketA", *key, "job-1", Utc::now()))
            .collect();
        store.put_batch(&records).unwrap();
        (CompletionListener::new(store.clone()), store)
    }

    fn message(id: &str, body: impl Into<String>) -> QueueMessage {
        QueueMessage {
            message_id: id.to_string(),
            body: body.into(),
        }
    }

    #[test]
    fn test_completion_marks_record() {
        let (listener, store) = listener_with(&["obj1", "obj2"]);

        let outcome = listener.handle_message(&message("m-1", restore_completed_event("bucketA", "obj1")));

        assert_eq!(
            outcome,
            MessageOutcome::Processed {
                marked: 1,
                untracked: 0
            }
        );
        assert!(store.get("bucketA", "obj1").unwrap().unwrap().restored);
        assert!(!store.get("bucketA", "obj2").unwrap().unwrap().restored);
    }

    #[test]
    fn test_redelivery_does_not_double_count() {
        let (listener, store) = listener_with(&["obj1", "obj2"]);
        let event = restore_completed_event("bucketA", "obj1");

        listener.handle_message(&message("m-1", event.clone()));
        listener.handle_message(&message("m-2", event));

        assert_eq!(store.count_by_job("job-1", true).unwrap(), 1);
        assert_eq!(store.count_by_job("job-1", false).unwrap(), 1);
    }

    #[test]
    fn test_untracked_object_is_ignored() {
        let (listener, store) = listener_with(&["obj1"]);

        let outcome = listener.handle_message(&message("m-1", restore_completed_event("bucketA", "ghost")));

        assert_eq!(
            outcome,
            MessageOutcome::Processed {
                marked: 0,
                untracked: 1
            }
        );
        assert!(store.get("bucketA", "ghost").unwrap().is_none());
    }

    #[test]
    fn test_other_events_are_ignored() {
        let (listener, _store) = listener_with(&["obj1"]);
        let body = r#"{"Records":[{"eventName":"ObjectRestore:Post","s3":{"bucket":{"name":"bucketA"},"object":{"key":"obj1"}}}]}"#;
        assert_eq!(listener.handle_message(&message("m-1", body)), MessageOutcome::Ignored);
        assert_eq!(listener.handle_message(&message("m-2", r#"{"Event":"s3:TestEvent"}"#)), MessageOutcome::Ignored);
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let (listener, _store) = listener_with(&["obj1"]);
        let outcome = listener.handle_message(&message("m-1", restore_completed_event("bucketA", "")));
        assert!(matches!(outcome, MessageOutcome::Rejected { .. }));
    }

    #[test]
    fn test_non_json_body_is_rejected() {
        let (listener, _store) = listener_with(&["obj1"]);
        let outcome = listener.handle_message(&message("m-1", "not json"));
        assert!(matches!(outcome, MessageOutcome::Rejected { .. }));
    }

    #[test]
    fn test_every_record_in_an_envelope_is_applied() {
        let (listener, store) = listener_with(&["obj1", "obj2"]);
        let body = serde_json::json!({
            "Records": [
                {"eventName": "ObjectRestore:Completed", "s3": {"bucket": {"name": "bucketA"}, "object": {"key": "obj1"}}},
                {"eventName": "ObjectRestore:Completed", "s3": {"bucket": {"name": "bucketA"}, "object": {"key": "obj2"}}}
            ]
        });

        let outcome = listener.handle_message(&message("m-1", body.to_string()));

        assert_eq!(
            outcome,
            MessageOutcome::Processed {
                marked: 2,
                untracked: 0
            }
        );
        assert_eq!(store.count_by_job("job-1", true).unwrap(), 2);
    }

    #[test]
    fn test_batch_continues_past_rejected_message() {
        let (listener, store) = listener_with(&["obj1"]);
        let batch = QueueBatch {
            records: vec![
                message("m-1", "garbage"),
                message("m-2", restore_completed_event("bucketA", "obj1")),
            ],
        };

        let report = listener.handle_batch(&batch);

        assert!(report.has_rejections());
        assert_eq!(report.messages.len(), 2);
        assert_eq!(report.marked(), 1);
        assert!(store.get("bucketA", "obj1").unwrap().unwrap().restored);
    }
}
