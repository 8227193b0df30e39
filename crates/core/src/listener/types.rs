//! Queue message, event envelope and outcome types.

use serde::{Deserialize, Serialize};

/// Event name of a finished restore.
pub const RESTORE_COMPLETED: &str = "ObjectRestore:Completed";

/// One delivered queue message. `body` holds the JSON event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    #[serde(rename = "messageId", default)]
    pub message_id: String,
    pub body: String,
}

/// A delivery of queue messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueBatch {
    #[serde(rename = "Records")]
    pub records: Vec<QueueMessage>,
}

/// Storage event envelope. Only the fields the listener reads are modelled.
#[derive(Debug, Deserialize)]
pub(crate) struct EventEnvelope {
    #[serde(rename = "Records")]
    pub records: Option<Vec<EventRecord>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventRecord {
    #[serde(rename = "eventName")]
    pub event_name: Option<String>,
    pub s3: Option<S3Entity>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct S3Entity {
    pub bucket: Option<BucketEntity>,
    pub object: Option<ObjectEntity>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BucketEntity {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObjectEntity {
    pub key: Option<String>,
}

impl EventRecord {
    pub fn is_restore_completed(&self) -> bool {
        self.event_name.as_deref() == Some(RESTORE_COMPLETED)
    }

    /// Non-empty (bucket, key) of the record, if both are present.
    pub fn location(&self) -> Option<(&str, &str)> {
        let s3 = self.s3.as_ref()?;
        let bucket = s3.bucket.as_ref()?.name.as_deref()?;
        let key = s3.object.as_ref()?.key.as_deref()?;
        if bucket.is_empty() || key.is_empty() {
            return None;
        }
        Some((bucket, key))
    }
}

/// What happened to one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Completion records were applied. `untracked` counts events for
    /// objects no job tracks.
    Processed { marked: u32, untracked: u32 },
    /// Nothing to do: no records, or no completion records.
    Ignored,
    /// Client error; redelivery will not help.
    Rejected { reason: String },
    /// Table store error.
    Failed { reason: String },
}

impl MessageOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            MessageOutcome::Processed { .. } => "processed",
            MessageOutcome::Ignored => "ignored",
            MessageOutcome::Rejected { .. } => "rejected",
            MessageOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageReport {
    pub message_id: String,
    #[serde(flatten)]
    pub outcome: MessageOutcome,
}

/// Outcome of every message in a delivery, in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListenerReport {
    pub messages: Vec<MessageReport>,
}

impl ListenerReport {
    pub fn has_rejections(&self) -> bool {
        self.messages
            .iter()
            .any(|m| matches!(m.outcome, MessageOutcome::Rejected { .. }))
    }

    pub fn marked(&self) -> u32 {
        self.messages
            .iter()
            .map(|m| match m.outcome {
                MessageOutcome::Processed { marked, .. } => marked,
                _ => 0,
            })
            .sum()
    }
}
