//! Reconciler API handlers.

use axum::{extract::State, Json};
use bulkrestore_core::{PassSummary, ReconcilerStatus};
use std::sync::Arc;

use crate::state::AppState;

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ReconcilerStatus> {
    Json(state.reconciler().status().await)
}

/// Run one reconcile pass now and return its summary.
pub async fn run_pass(State(state): State<Arc<AppState>>) -> Json<PassSummary> {
    Json(state.reconciler().run_pass().await)
}
