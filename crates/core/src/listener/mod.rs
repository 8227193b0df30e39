//! Object completion listener.
//!
//! Consumes restore-completed events delivered through the queue and flips
//! the matching object record to restored.

mod handler;
mod types;

pub use handler::CompletionListener;
pub use types::{
    ListenerReport, MessageOutcome, MessageReport, QueueBatch, QueueMessage, RESTORE_COMPLETED,
};
