//! Typed views of the upstream JSON payloads pipelines deserialize.
//!
//! Only the fields pipelines actually read are modeled; everything else in
//! the upstream response is ignored by `serde`, not forwarded.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `GET search/repositories` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchReposResponse {
    /// Approximate total matches, per upstream.
    pub total_count: u64,
    /// The page of results.
    pub items: Vec<UpstreamRepo>,
}

/// `GET search/issues` response envelope, used for weekly PR/issue counts.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchCountResponse {
    /// Count of matching items; pipelines only need the count, not the items.
    pub total_count: u64,
}

/// The repo owner sub-object.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamOwner {
    /// Owner login.
    pub login: String,
}

/// A repository as returned by the search and repo-detail endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamRepo {
    /// Upstream numeric id.
    pub id: i64,
    /// Owner sub-object.
    pub owner: UpstreamOwner,
    /// Repo name.
    pub name: String,
    /// Primary language, if detected.
    pub language: Option<String>,
    /// Star count.
    pub stargazers_count: i64,
    /// Fork count.
    pub forks_count: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-push timestamp.
    pub pushed_at: DateTime<Utc>,
    /// Archived flag.
    pub archived: bool,
    /// Fork flag.
    pub fork: bool,
}

/// One weekly bucket of `GET .../stats/commit_activity`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitActivityWeek {
    /// Unix timestamp of the week start.
    pub week: i64,
    /// Commits for this week.
    pub total: i64,
}

/// One entry of `GET .../stats/contributors`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContributorStat {
    /// Total commits by this contributor.
    pub total: i64,
    /// The contributor, when upstream can attribute one.
    pub author: Option<UpstreamOwner>,
}

/// A sub-field present only on pull requests, absent on plain issues.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestMarker {}

/// An issue or pull request as returned by the issues-search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamIssue {
    /// Issue/PR number, used to fetch comments.
    pub number: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Present iff this issue is actually a pull request.
    pub pull_request: Option<PullRequestMarker>,
}

/// Author-association tags upstream attaches to comments.
pub const MAINTAINER_ASSOCIATIONS: [&str; 3] = ["OWNER", "MEMBER", "COLLABORATOR"];

/// A single issue/PR comment.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamComment {
    /// When the comment was posted.
    pub created_at: DateTime<Utc>,
    /// The commenter's relationship to the repo.
    pub author_association: String,
}
