use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::{error::ApiResult, main_lib::AppState};
use quoteflow_core::jobs::{FetchRequest, JobId};
use quoteflow_core::scheduler::ScheduleRunSummary;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnqueueResponse {
    job_id: JobId,
}

/// Queues a fetch and returns without waiting for it.
async fn enqueue_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FetchRequest>,
) -> ApiResult<(StatusCode, Json<EnqueueResponse>)> {
    let request = request.validated()?;
    let job_id = state.queue.enqueue(request).await?;
    Ok((StatusCode::ACCEPTED, Json(EnqueueResponse { job_id })))
}

/// Runs the daily schedule once, outside its timer.
async fn run_schedule(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<ScheduleRunSummary>)> {
    let summary = state.scheduler.run_once().await;
    Ok((StatusCode::ACCEPTED, Json(summary)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", post(enqueue_job))
        .route("/jobs/schedule/run", post(run_schedule))
}
