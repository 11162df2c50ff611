use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{extract::State, routing::get, Json, Router};
use quoteflow_core::scheduler::SchedulerState;
use serde::Serialize;

/// Liveness: the process is up.
async fn healthz() -> &'static str {
    "ok"
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadyStatus {
    status: &'static str,
    pending_jobs: usize,
    scheduler: SchedulerState,
}

/// Readiness: the store answers and the queue can be counted.
async fn readyz(State(state): State<Arc<AppState>>) -> ApiResult<Json<ReadyStatus>> {
    state.price_store.ping()?;
    let pending_jobs = state.queue.pending()?;
    Ok(Json(ReadyStatus {
        status: "ready",
        pending_jobs,
        scheduler: state.scheduler.state(),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
