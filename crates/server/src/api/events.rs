//! Queue delivery endpoint for restore completion events.

use axum::{extract::State, http::StatusCode, Json};
use bulkrestore_core::{ListenerReport, QueueBatch};
use std::sync::Arc;

use crate::state::AppState;

/// Process a batch of queue messages.
///
/// Answers 400 when any message was rejected: a malformed message is a client
/// error and redelivering it cannot succeed. The status covers the whole batch,
/// so the per-message report is what tells processed messages from rejected
/// ones; applying a processed message again is harmless. Store failures are
/// reported per message and do not change the status.
pub async fn receive_events(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<QueueBatch>,
) -> (StatusCode, Json<ListenerReport>) {
    let report = state.listener().handle_batch(&batch);
    let status = if report.has_rejections() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    (status, Json(report))
}
