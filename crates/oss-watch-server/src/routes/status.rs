//! `GET /v1/status` — redacted configuration plus the last run of each job type.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use oss_watch_store::Store;

use crate::error::ApiErrorResponse;
use crate::state::AppState;
use crate::types::StatusResponse;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(status))
}

async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiErrorResponse> {
    let config = &state.config;
    let config = serde_json::json!({
        "github_token": "[redacted]",
        "api_rate_limit_safety_threshold": config.api_rate_limit_safety_threshold,
        "deep_analysis_max_requests_per_run": config.deep_analysis_max_requests_per_run,
        "min_stars": config.min_stars,
        "max_age_months": config.max_age_months,
        "max_days_since_push": config.max_days_since_push,
        "health_index_weight_velocity": config.health_index_weight_velocity,
        "health_index_weight_responsiveness": config.health_index_weight_responsiveness,
        "health_index_weight_contributors": config.health_index_weight_contributors,
        "health_index_weight_adoption": config.health_index_weight_adoption,
        "database_url": config.database_url.as_ref().map(|_| "[redacted]"),
        "server_bind_addr": config.server_bind_addr,
        "log_format": config.log_format,
        "max_body_size": config.max_body_size,
    });

    let last_job_runs = state.store.latest_job_runs().await.map_err(ApiErrorResponse::from)?;

    Ok(Json(StatusResponse { config, last_job_runs }))
}
