//! `GET /v1/watchlist/*` — the generated-watchlist read surface.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use oss_watch_core::{Error, WatchlistSort};
use oss_watch_store::Store;

use crate::error::ApiErrorResponse;
use crate::state::AppState;
use crate::types::{
    WatchlistDatesResponse, WatchlistExportQuery, WatchlistLatestQuery, WatchlistResponse,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/latest", get(latest))
        .route("/export", get(export))
        .route("/dates", get(dates))
}

fn parse_sort(sort: Option<&str>) -> Result<WatchlistSort, Error> {
    match sort {
        None | Some("momentum") => Ok(WatchlistSort::Momentum),
        Some("durability") => Ok(WatchlistSort::Durability),
        Some("adoption") => Ok(WatchlistSort::Adoption),
        Some(other) => Err(Error::ValidationError(format!("unknown sort field: {other}"))),
    }
}

fn sort_entries(entries: &mut [oss_watch_core::WatchlistEntry], sort: WatchlistSort) {
    entries.sort_by(|a, b| {
        let (a_score, b_score) = match sort {
            WatchlistSort::Momentum => (a.momentum_score, b.momentum_score),
            WatchlistSort::Durability => (a.durability_score, b.durability_score),
            WatchlistSort::Adoption => (a.adoption_score, b.adoption_score),
        };
        b_score.partial_cmp(&a_score).unwrap_or(std::cmp::Ordering::Equal)
    });
}

async fn latest(
    State(state): State<AppState>,
    Query(query): Query<WatchlistLatestQuery>,
) -> Result<Json<WatchlistResponse>, ApiErrorResponse> {
    let sort = parse_sort(query.sort.as_deref())?;

    let Some(watchlist_date) = state.store.latest_watchlist_date().await? else {
        return Ok(Json(WatchlistResponse {
            watchlist_date: chrono::Utc::now(),
            entries: Vec::new(),
        }));
    };

    let mut entries = state.store.watchlist_entries_for_date(watchlist_date).await?;
    sort_entries(&mut entries, sort);

    Ok(Json(WatchlistResponse { watchlist_date, entries }))
}

async fn export(
    State(state): State<AppState>,
    Query(query): Query<WatchlistExportQuery>,
) -> Result<Json<WatchlistResponse>, ApiErrorResponse> {
    let entries = state.store.watchlist_entries_for_date(query.date).await?;
    if entries.is_empty() {
        return Err(Error::NotFound(format!(
            "no watchlist generated for {}",
            query.date.format("%Y-%m-%d")
        ))
        .into());
    }

    Ok(Json(WatchlistResponse {
        watchlist_date: query.date,
        entries,
    }))
}

async fn dates(State(state): State<AppState>) -> Result<Json<WatchlistDatesResponse>, ApiErrorResponse> {
    let dates = state.store.watchlist_dates().await?;
    Ok(Json(WatchlistDatesResponse { dates }))
}
