//! Request/response DTOs for the trigger and read surfaces.

use chrono::{DateTime, Utc};
use oss_watch_core::{DeepSnapshot, DiscoverySnapshot, JobRun, Repo, WatchlistEntry};
use serde::{Deserialize, Serialize};

/// Standard error body, returned alongside a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Terminal status of a triggered job run.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Completed,
    Failed,
}

/// Response body for every `POST /v1/jobs/*` route.
#[derive(Debug, Clone, Serialize)]
pub struct JobResultResponse {
    pub status: JobOutcome,
    pub stats: serde_json::Value,
}

/// Body of `POST /v1/jobs/deep-analysis`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeepAnalysisRequest {
    pub max_repos: u32,
}

/// Query params for `GET /v1/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoListQuery {
    pub language: Option<String>,
    pub min_stars: Option<i64>,
    pub max_stars: Option<i64>,
    pub eligible: Option<bool>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Response body of `GET /v1/repos`.
#[derive(Debug, Clone, Serialize)]
pub struct RepoListResponse {
    pub repos: Vec<Repo>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

/// Response body of `GET /v1/repos/{owner}/{name}`.
#[derive(Debug, Clone, Serialize)]
pub struct RepoDetailResponse {
    pub repo: Repo,
    pub latest_discovery_snapshot: Option<DiscoverySnapshot>,
    pub latest_deep_snapshot: Option<DeepSnapshot>,
    pub discovery_snapshot_count: usize,
    pub deep_snapshot_count: usize,
}

/// Response body of the per-repo snapshot history routes.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryHistoryResponse {
    pub full_name: String,
    pub snapshots: Vec<DiscoverySnapshot>,
}

/// Response body of the per-repo snapshot history routes.
#[derive(Debug, Clone, Serialize)]
pub struct DeepHistoryResponse {
    pub full_name: String,
    pub snapshots: Vec<DeepSnapshot>,
}

/// Query params for `GET /v1/watchlist/latest`.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchlistLatestQuery {
    pub sort: Option<String>,
}

/// Response body of `GET /v1/watchlist/latest`.
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistResponse {
    pub watchlist_date: DateTime<Utc>,
    pub entries: Vec<WatchlistEntry>,
}

/// Query params for `GET /v1/watchlist/export`.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchlistExportQuery {
    pub date: DateTime<Utc>,
}

/// Response body of `GET /v1/watchlist/dates`.
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistDatesResponse {
    pub dates: Vec<DateTime<Utc>>,
}

/// Response body of `GET /v1/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub config: serde_json::Value,
    pub last_job_runs: Vec<JobRun>,
}

/// The criteria a repo must meet to be part of the discovered universe,
/// echoed back in `GET /v1/universe/stats` for reference.
#[derive(Debug, Clone, Serialize)]
pub struct UniverseCriteria {
    pub min_stars: u32,
    pub max_age_months: u32,
    pub max_days_since_push: u32,
    pub archived: bool,
    pub fork: bool,
}

/// One entry of the language breakdown in `GET /v1/universe/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageCount {
    pub language: String,
    pub count: u64,
}

/// Completion timestamps of the most recent completed job runs, as returned
/// by `GET /v1/universe/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct LastUpdate {
    pub discovery: Option<DateTime<Utc>>,
    pub deep_analysis: Option<DateTime<Utc>>,
}

/// Response body of `GET /v1/universe/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct UniverseStatsResponse {
    pub universe_criteria: UniverseCriteria,
    pub total_repos: u64,
    pub eligible_repos: u64,
    pub ineligible_repos: u64,
    pub language_breakdown: Vec<LanguageCount>,
    pub last_update: LastUpdate,
}
