//! `POST /v1/jobs/*` — triggers for the four pipelines.

use std::time::Instant;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use oss_watch_pipelines::{DeepAnalysis, Discovery, QueueManager, WatchlistGenerator};
#[cfg(feature = "metrics")]
use oss_watch_store::Store;
use tokio_util::sync::CancellationToken;

use crate::error::ApiErrorResponse;
use crate::state::AppState;
use crate::types::{DeepAnalysisRequest, JobOutcome, JobResultResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/discovery", post(run_discovery))
        .route("/queue-refresh", post(run_queue_refresh))
        .route("/deep-analysis", post(run_deep_analysis))
        .route("/watchlist", post(run_watchlist))
}

/// Observes a job run's wall-clock duration under `job_type`, then refreshes
/// the queue-depth/rate-limit gauges from current store/client state. A
/// no-op when the `metrics` feature is off.
#[cfg(feature = "metrics")]
async fn record_job_metrics(state: &AppState, job_type: &str, elapsed_secs: f64) {
    let Some(metrics) = &state.metrics else {
        return;
    };
    metrics
        .job_run_duration_seconds
        .with_label_values(&[job_type])
        .observe(elapsed_secs);

    if let Ok(summary) = state.store.queue_summary().await {
        metrics.queue_depth.set(summary.total as i64);
    }

    let stats = state.client.stats().await;
    if let Some(remaining) = stats.core_remaining {
        metrics.rate_limit_remaining.set(f64::from(remaining));
    }
}

#[cfg(not(feature = "metrics"))]
async fn record_job_metrics(_state: &AppState, _job_type: &str, _elapsed_secs: f64) {}

async fn run_discovery(
    State(state): State<AppState>,
) -> Result<Json<JobResultResponse>, ApiErrorResponse> {
    let pipeline = Discovery::new(state.store.clone(), state.client.clone(), (*state.config).clone());
    let started = Instant::now();
    let result = pipeline.run(chrono::Utc::now()).await;
    record_job_metrics(&state, "discovery", started.elapsed().as_secs_f64()).await;
    match result {
        Ok(stats) => Ok(Json(JobResultResponse {
            status: JobOutcome::Completed,
            stats: serde_json::to_value(stats)?,
        })),
        Err(err) => Ok(Json(JobResultResponse {
            status: JobOutcome::Failed,
            stats: serde_json::json!({ "error": err.to_string() }),
        })),
    }
}

async fn run_queue_refresh(
    State(state): State<AppState>,
) -> Result<Json<JobResultResponse>, ApiErrorResponse> {
    let manager = QueueManager::new(state.store.clone());
    let started = Instant::now();
    let result = manager.refresh_queue(chrono::Utc::now()).await;
    record_job_metrics(&state, "queue_refresh", started.elapsed().as_secs_f64()).await;
    match result {
        Ok(stats) => Ok(Json(JobResultResponse {
            status: JobOutcome::Completed,
            stats: serde_json::to_value(stats)?,
        })),
        Err(err) => Ok(Json(JobResultResponse {
            status: JobOutcome::Failed,
            stats: serde_json::json!({ "error": err.to_string() }),
        })),
    }
}

async fn run_deep_analysis(
    State(state): State<AppState>,
    Json(body): Json<DeepAnalysisRequest>,
) -> Result<Json<JobResultResponse>, ApiErrorResponse> {
    let pipeline = DeepAnalysis::new(state.store.clone(), state.client.clone(), (*state.config).clone());
    let started = Instant::now();
    let result = pipeline
        .run(body.max_repos, chrono::Utc::now(), CancellationToken::new())
        .await;
    match result {
        Ok(stats) => {
            record_job_metrics(&state, "deep_analysis", started.elapsed().as_secs_f64()).await;
            Ok(Json(JobResultResponse {
                status: JobOutcome::Completed,
                stats: serde_json::to_value(stats)?,
            }))
        }
        Err(err @ oss_watch_core::Error::ValidationError(_)) => Err(err.into()),
        Err(err) => {
            record_job_metrics(&state, "deep_analysis", started.elapsed().as_secs_f64()).await;
            Ok(Json(JobResultResponse {
                status: JobOutcome::Failed,
                stats: serde_json::json!({ "error": err.to_string() }),
            }))
        }
    }
}

async fn run_watchlist(
    State(state): State<AppState>,
) -> Result<Json<JobResultResponse>, ApiErrorResponse> {
    let generator = WatchlistGenerator::new(state.store.clone());
    let started = Instant::now();
    let result = generator.run(chrono::Utc::now()).await;
    record_job_metrics(&state, "watchlist", started.elapsed().as_secs_f64()).await;
    match result {
        Ok(stats) => Ok(Json(JobResultResponse {
            status: JobOutcome::Completed,
            stats: serde_json::to_value(stats)?,
        })),
        Err(err) => Ok(Json(JobResultResponse {
            status: JobOutcome::Failed,
            stats: serde_json::json!({ "error": err.to_string() }),
        })),
    }
}
