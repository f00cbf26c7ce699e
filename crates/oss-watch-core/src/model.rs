//! Data model types for the discovery/analysis universe.
//!
//! One struct per entity from the design's data model: `Repo`,
//! `DiscoverySnapshot`, `DeepSnapshot`, `QueueEntry`, `JobRun`, and
//! `WatchlistEntry`. Snapshots are append-only; the Store never mutates one
//! once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row per distinct upstream repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repo {
    /// Internal identifier, assigned on first insert.
    pub id: Uuid,
    /// Upstream numeric identifier (unique).
    pub github_id: i64,
    /// Repository owner login.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// `owner/name`, unique.
    pub full_name: String,
    /// Primary language, if known.
    pub language: Option<String>,
    /// Current star count.
    pub stars: i64,
    /// Current fork count.
    pub forks: i64,
    /// Repository creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last push.
    pub pushed_at: DateTime<Utc>,
    /// Whether the repo is archived.
    pub archived: bool,
    /// Whether the repo is a fork.
    pub is_fork: bool,
    /// When discovery first saw this repo.
    pub first_discovered_at: DateTime<Utc>,
    /// When discovery last saw this repo.
    pub last_seen_at: DateTime<Utc>,
    /// Whether the repo currently satisfies the eligibility predicate.
    pub eligible: bool,
}

impl Repo {
    /// `owner/name`.
    pub fn full_name(owner: &str, name: &str) -> String {
        format!("{owner}/{name}")
    }
}

/// Immutable point-in-time view of a repo's cheap attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoverySnapshot {
    /// Internal identifier.
    pub id: Uuid,
    /// The repo this snapshot describes.
    pub repo_id: Uuid,
    /// When this snapshot was taken.
    pub snapshot_date: DateTime<Utc>,
    /// Star count at snapshot time.
    pub stars: i64,
    /// Fork count at snapshot time.
    pub forks: i64,
    /// Last-push timestamp at snapshot time.
    pub pushed_at: DateTime<Utc>,
    /// Eligibility at snapshot time.
    pub eligible: bool,
    /// Opaque raw payload from the upstream API, preserved for audit.
    pub raw: serde_json::Value,
}

/// Contributor-health signal group of a `DeepSnapshot`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContributorHealth {
    /// Monthly active contributor counts over the last 6 months.
    pub monthly_active_contributors_6m: Option<[i64; 6]>,
    /// Contribution distribution summary, if computable.
    pub distribution: Option<ContributionDistribution>,
    /// Why the above is missing, when it is.
    pub availability: Availability,
}

/// Summary of how commits are distributed across contributors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContributionDistribution {
    /// Total distinct contributors observed.
    pub total_contributors: u32,
    /// Commits made by the single largest contributor.
    pub top_contributor_commits: i64,
    /// Share of all commits made by the top contributor, in [0, 1].
    pub top_1_share: f64,
    /// Share of all commits made by the top 5 contributors, in [0, 1].
    pub top_5_share: f64,
}

/// Velocity signal group: weekly activity series and trend slopes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Velocity {
    /// Weekly commit counts over the last 12 weeks.
    pub weekly_commits_12w: Option<Vec<i64>>,
    /// Weekly PR-creation counts over the last 12 weeks.
    pub weekly_prs_12w: Option<Vec<i64>>,
    /// Weekly issue-creation counts over the last 12 weeks.
    pub weekly_issues_12w: Option<Vec<i64>>,
    /// Linear-regression slope of the commit series.
    pub commit_trend_slope: Option<f64>,
    /// Linear-regression slope of the PR series.
    pub pr_trend_slope: Option<f64>,
    /// Linear-regression slope of the issue series.
    pub issue_trend_slope: Option<f64>,
}

/// Responsiveness signal group: time-to-first-maintainer-response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Responsiveness {
    /// Median hours to first maintainer response, for issues.
    pub median_issue_response_time_hours: Option<f64>,
    /// Median hours to first maintainer response, for PRs.
    pub median_pr_response_time_hours: Option<f64>,
    /// Availability tag for this signal group.
    pub availability: Availability,
}

/// Adoption signal group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Adoption {
    /// Count of known dependents, when obtainable.
    pub dependents_count: Option<i64>,
    /// 30-day package-manager downloads, when obtainable.
    pub npm_downloads_30d: Option<i64>,
    /// `forks / max(stars, 1)`.
    pub fork_to_star_ratio: Option<f64>,
    /// Availability tag for this signal group.
    pub availability: Availability,
}

/// Community-risk signal group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommunityRisk {
    /// Share of commits from the single largest contributor, in [0, 1].
    pub top_contributor_share: Option<f64>,
    /// Gini coefficient of the contribution distribution. Left `None` until
    /// the full contributor list (not a sample) is available; see the design
    /// notes on this field before computing it from a partial list.
    pub gini_coefficient: Option<f64>,
    /// Count of contributors considered active.
    pub active_maintainers_count: Option<u32>,
}

/// A short string labeling why a signal is or isn't present.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// The signal was computed successfully.
    Available,
    /// The signal is missing because of incomplete input, not an error.
    Partial,
    /// Not enough upstream data existed to compute the signal.
    InsufficientData,
    /// Upstream does not expose this signal at all (yet).
    #[default]
    NotAvailable,
    /// An error occurred while computing the signal.
    Error,
}

/// Immutable bundle of computed signals for one repo at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeepSnapshot {
    /// Internal identifier.
    pub id: Uuid,
    /// The repo this snapshot describes.
    pub repo_id: Uuid,
    /// When this snapshot was taken.
    pub snapshot_date: DateTime<Utc>,
    /// Contributor-health signals.
    pub contributor_health: ContributorHealth,
    /// Velocity signals.
    pub velocity: Velocity,
    /// Responsiveness signals.
    pub responsiveness: Responsiveness,
    /// Adoption signals.
    pub adoption: Adoption,
    /// Community-risk signals.
    pub community_risk: CommunityRisk,
    /// Optional weighted composite of the above.
    pub health_index: Option<f64>,
    /// Full raw metrics bundle, for audit/debugging.
    pub metrics: serde_json::Value,
}

impl DeepSnapshot {
    /// Convenience accessor: `community_risk.active_maintainers_count`.
    pub fn active_maintainers_count(&self) -> Option<u32> {
        self.community_risk.active_maintainers_count
    }

    /// Convenience accessor: `community_risk.top_contributor_share`.
    pub fn top_contributor_share(&self) -> Option<f64> {
        self.community_risk.top_contributor_share
    }

    /// Convenience accessor: `velocity.commit_trend_slope`.
    pub fn commit_trend_slope(&self) -> Option<f64> {
        self.velocity.commit_trend_slope
    }

    /// Convenience accessor: `responsiveness.median_issue_response_time_hours`.
    pub fn median_issue_response_hours(&self) -> Option<f64> {
        self.responsiveness.median_issue_response_time_hours
    }
}

/// A pending unit of deep-analysis work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntry {
    /// Internal identifier.
    pub id: Uuid,
    /// The repo awaiting (or having received) analysis.
    pub repo_id: Uuid,
    /// Integer priority; higher goes first.
    pub priority: i32,
    /// Human-readable reason tag, e.g. `newly_eligible`.
    pub priority_reason: PriorityReason,
    /// When this entry was queued (or last re-queued).
    pub queued_at: DateTime<Utc>,
    /// Whether DeepAnalysis has already processed this entry.
    pub processed: bool,
    /// When it was processed, if it was.
    pub processed_at: Option<DateTime<Utc>>,
    /// When deep analysis last ran for this repo.
    pub last_deep_analysis_at: Option<DateTime<Utc>>,
}

/// Priority classification reason, evaluated top-to-bottom; first match wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriorityReason {
    /// First-discovered within the last 14 days.
    NewlyEligible,
    /// Star velocity exceeds 10 stars/day.
    HighMomentum,
    /// Last push within the last 3 days.
    ActivitySpike,
    /// No deep snapshot, or the latest one is more than 30 days old.
    Stale,
    /// None of the above applied.
    Regular,
}

impl PriorityReason {
    /// The fixed integer priority for this classification.
    pub fn priority(self) -> i32 {
        match self {
            PriorityReason::NewlyEligible => 10,
            PriorityReason::HighMomentum => 8,
            PriorityReason::ActivitySpike => 7,
            PriorityReason::Stale => 5,
            PriorityReason::Regular => 3,
        }
    }

    /// Short machine-readable tag, as stored on `QueueEntry::priority_reason`.
    pub fn as_str(self) -> &'static str {
        match self {
            PriorityReason::NewlyEligible => "newly_eligible",
            PriorityReason::HighMomentum => "high_momentum",
            PriorityReason::ActivitySpike => "activity_spike",
            PriorityReason::Stale => "stale",
            PriorityReason::Regular => "regular",
        }
    }
}

/// The status of a `JobRun`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The job is still executing.
    Running,
    /// The job finished successfully.
    Completed,
    /// The job aborted with an error.
    Failed,
}

/// The kind of pipeline a `JobRun` records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// The Discovery pipeline.
    Discovery,
    /// A QueueManager refresh.
    QueueRefresh,
    /// The DeepAnalysis pipeline.
    DeepAnalysis,
    /// The WatchlistGenerator pipeline.
    Watchlist,
}

/// Audit record of one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRun {
    /// Internal identifier.
    pub id: Uuid,
    /// Which pipeline this run belongs to.
    pub job_type: JobType,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished, if it has.
    pub completed_at: Option<DateTime<Utc>>,
    /// Current status.
    pub status: JobStatus,
    /// Free-form stats payload, shape depends on `job_type`.
    pub stats: serde_json::Value,
    /// Error message, set iff `status == Failed`.
    pub error_message: Option<String>,
}

/// One row per repo per watchlist generation date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    /// Internal identifier.
    pub id: Uuid,
    /// The repo this entry scores.
    pub repo_id: Uuid,
    /// The generation date this entry belongs to.
    pub watchlist_date: DateTime<Utc>,
    /// Momentum score, in [0, 100].
    pub momentum_score: f64,
    /// Durability score, in [0, 100].
    pub durability_score: f64,
    /// Adoption score, in [0, 100].
    pub adoption_score: f64,
    /// 1-2 sentence rationale for why the repo surfaced.
    pub rationale: String,
    /// Factor breakdowns and supporting data, for display/export.
    pub metrics_snapshot: serde_json::Value,
}

/// Sort key for reading back the latest watchlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchlistSort {
    /// Sort by momentum score, descending.
    Momentum,
    /// Sort by durability score, descending.
    Durability,
    /// Sort by adoption score, descending.
    Adoption,
}
