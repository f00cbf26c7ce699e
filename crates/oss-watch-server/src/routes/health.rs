//! Liveness/readiness probes, at root level (outside `/v1`).

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use oss_watch_store::Store;
use serde::Serialize;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        timestamp: Utc::now(),
    })
}

#[derive(Serialize)]
struct ReadinessStatus {
    ready: bool,
    store: bool,
}

async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessStatus>, (StatusCode, Json<ReadinessStatus>)> {
    let store_ok = state.store.latest_job_runs().await.is_ok();
    let status = ReadinessStatus { ready: store_ok, store: store_ok };

    if status.ready {
        Ok(Json(status))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(status)))
    }
}
