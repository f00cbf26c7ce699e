//! `GET /v1/repos` and `GET /v1/repos/{owner}/{name}` — the repo read surface.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use oss_watch_core::Error;
use oss_watch_store::{Page, RepoFilter, RepoSort, RepoSortField, Store};

use crate::error::ApiErrorResponse;
use crate::state::AppState;
use crate::types::{
    DeepHistoryResponse, DiscoveryHistoryResponse, RepoDetailResponse, RepoListQuery,
    RepoListResponse,
};

/// Cap on rows returned by the full-history routes; large enough that no
/// repo's snapshot series is realistically truncated, small enough to stay a
/// valid SQL `limit` parameter.
const FULL_HISTORY_LIMIT: usize = 10_000;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_repos))
        .route("/:owner/:name", get(get_repo))
        .route("/:owner/:name/history/discovery", get(discovery_history))
        .route("/:owner/:name/history/deep", get(deep_history))
}

async fn list_repos(
    State(state): State<AppState>,
    Query(query): Query<RepoListQuery>,
) -> Result<Json<RepoListResponse>, ApiErrorResponse> {
    let filter = RepoFilter {
        language: query.language,
        min_stars: query.min_stars,
        max_stars: query.max_stars,
        eligible: query.eligible,
    };

    let sort = match query.sort.as_deref() {
        None | Some("stars") => RepoSort { field: RepoSortField::Stars, descending: true },
        Some("created_at") => RepoSort { field: RepoSortField::CreatedAt, descending: true },
        Some("pushed_at") => RepoSort { field: RepoSortField::PushedAt, descending: true },
        Some(other) => {
            return Err(Error::ValidationError(format!(
                "unknown sort field: {other}"
            ))
            .into());
        }
    };

    let page = Page {
        page: query.page.unwrap_or(1).max(1),
        per_page: query.per_page.unwrap_or(20).clamp(1, 100),
    };

    let (repos, total) = state.store.list_repos(filter, sort, page).await?;

    Ok(Json(RepoListResponse {
        repos,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

async fn get_repo(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<RepoDetailResponse>, ApiErrorResponse> {
    let repo = state
        .store
        .get_repo_by_full_name(&owner, &name)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{owner}/{name}")))?;

    let discovery_snapshots = state.store.latest_discovery_snapshots(repo.id, FULL_HISTORY_LIMIT).await?;
    let latest_deep_snapshot = state.store.latest_deep_snapshot(repo.id).await?;
    let deep_snapshot_count = usize::from(latest_deep_snapshot.is_some());

    Ok(Json(RepoDetailResponse {
        discovery_snapshot_count: discovery_snapshots.len(),
        latest_discovery_snapshot: discovery_snapshots.into_iter().next(),
        latest_deep_snapshot,
        deep_snapshot_count,
        repo,
    }))
}

async fn discovery_history(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<DiscoveryHistoryResponse>, ApiErrorResponse> {
    let repo = state
        .store
        .get_repo_by_full_name(&owner, &name)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{owner}/{name}")))?;

    let snapshots = state.store.latest_discovery_snapshots(repo.id, FULL_HISTORY_LIMIT).await?;

    Ok(Json(DiscoveryHistoryResponse {
        full_name: repo.full_name,
        snapshots,
    }))
}

async fn deep_history(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<DeepHistoryResponse>, ApiErrorResponse> {
    let repo = state
        .store
        .get_repo_by_full_name(&owner, &name)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{owner}/{name}")))?;

    let snapshots = state.store.deep_snapshots_for_repo(repo.id, FULL_HISTORY_LIMIT).await?;

    Ok(Json(DeepHistoryResponse {
        full_name: repo.full_name,
        snapshots,
    }))
}
