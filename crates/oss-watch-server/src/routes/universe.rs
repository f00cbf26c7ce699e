//! `GET /v1/universe/stats` — overview of the discovered universe.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use oss_watch_store::Store;

use crate::error::ApiErrorResponse;
use crate::state::AppState;
use crate::types::{
    LanguageCount, LastUpdate, UniverseCriteria, UniverseStatsResponse,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/stats", get(universe_stats))
}

async fn universe_stats(
    State(state): State<AppState>,
) -> Result<Json<UniverseStatsResponse>, ApiErrorResponse> {
    let stats = state.store.universe_stats().await?;

    Ok(Json(UniverseStatsResponse {
        universe_criteria: UniverseCriteria {
            min_stars: state.config.min_stars,
            max_age_months: state.config.max_age_months,
            max_days_since_push: state.config.max_days_since_push,
            archived: false,
            fork: false,
        },
        total_repos: stats.total_repos,
        eligible_repos: stats.eligible_repos,
        ineligible_repos: stats.ineligible_repos,
        language_breakdown: stats
            .language_counts
            .into_iter()
            .map(|(language, count)| LanguageCount { language, count })
            .collect(),
        last_update: LastUpdate {
            discovery: stats.last_completed_discovery_at,
            deep_analysis: stats.last_completed_deep_analysis_at,
        },
    }))
}
