//! Restore job API handlers.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bulkrestore_core::{IntakeReceipt, IntakeRequest, Job, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

/// Maximum allowed page size for job listings
const MAX_LIMIT: usize = 1000;

/// Default page size for job listings
const DEFAULT_LIMIT: usize = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing jobs
#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    /// Resume after this job ID
    pub start_after: Option<String>,
    /// Maximum number of jobs to return
    pub limit: Option<usize>,
}

/// Response for listing jobs
#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<Job>,
    /// Pass back as `start_after` for the next page
    pub next: Option<String>,
}

/// A job with its object counts
#[derive(Debug, Serialize)]
pub struct JobDetailResponse {
    #[serde(flatten)]
    pub job: Job,
    pub pending_files: u64,
    pub restored_files: u64,
}

/// Intake failure body
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IntakeErrorResponse {
    pub error: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct JobErrorResponse {
    pub error: String,
}

type JobFailure = (StatusCode, Json<JobErrorResponse>);

fn store_failure(e: StoreError) -> JobFailure {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(JobErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a bulk restore job.
///
/// Every failure, including an unparseable body, answers 500 with `{"Error": ...}`.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<IntakeReceipt>, impl IntoResponse> {
    let failure = |error: String| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(IntakeErrorResponse { error }),
        )
    };

    let request: IntakeRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected intake body");
            return Err(failure(format!("Invalid request body: {}", e)));
        }
    };

    match state.intake().submit(&request).await {
        Ok(receipt) => Ok(Json(receipt)),
        Err(e) => Err(failure(e.to_string())),
    }
}

/// Get a job by ID with its pending and restored object counts
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobDetailResponse>, JobFailure> {
    let job = match state.jobs().get(&id) {
        Ok(Some(job)) => job,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(JobErrorResponse {
                    error: format!("Job not found: {}", id),
                }),
            ));
        }
        Err(e) => return Err(store_failure(e)),
    };

    let pending_files = state
        .records()
        .count_by_job(&id, false)
        .map_err(store_failure)?;
    let restored_files = state
        .records()
        .count_by_job(&id, true)
        .map_err(store_failure)?;

    Ok(Json(JobDetailResponse {
        job,
        pending_files,
        restored_files,
    }))
}

/// List one page of jobs ordered by ID
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListJobsParams>,
) -> Result<Json<ListJobsResponse>, JobFailure> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let page = state
        .jobs()
        .scan(params.start_after.as_deref(), limit)
        .map_err(store_failure)?;

    Ok(Json(ListJobsResponse {
        jobs: page.jobs,
        next: page.last_evaluated_key,
    }))
}
