//! The `Store` trait: typed, transactional access to the entities of the
//! data model. Intent-based, not a thin SQL passthrough — see each method's
//! doc comment for the exact query shape pipelines rely on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oss_watch_core::{
    DeepSnapshot, DiscoverySnapshot, JobRun, JobType, PriorityReason, QueueEntry, Repo, Result,
    WatchlistEntry,
};
use uuid::Uuid;

/// Fields of a `Repo` that discovery upserts; `id`, `first_discovered_at`
/// are assigned by the store itself.
#[derive(Debug, Clone)]
pub struct RepoUpsert {
    /// Upstream numeric id.
    pub github_id: i64,
    /// Owner login.
    pub owner: String,
    /// Repo name.
    pub name: String,
    /// Primary language.
    pub language: Option<String>,
    /// Star count.
    pub stars: i64,
    /// Fork count.
    pub forks: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-push timestamp.
    pub pushed_at: DateTime<Utc>,
    /// Archived flag.
    pub archived: bool,
    /// Fork flag.
    pub is_fork: bool,
    /// Eligibility computed by the caller.
    pub eligible: bool,
}

/// Filter predicates for [`Store::list_repos`]; `None` means "don't filter
/// on this field".
#[derive(Debug, Clone, Default)]
pub struct RepoFilter {
    pub language: Option<String>,
    pub min_stars: Option<i64>,
    pub max_stars: Option<i64>,
    pub eligible: Option<bool>,
}

/// Column [`Store::list_repos`] sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoSortField {
    Stars,
    CreatedAt,
    PushedAt,
}

/// Sort direction and column for [`Store::list_repos`].
#[derive(Debug, Clone, Copy)]
pub struct RepoSort {
    pub field: RepoSortField,
    pub descending: bool,
}

impl Default for RepoSort {
    fn default() -> Self {
        Self {
            field: RepoSortField::Stars,
            descending: true,
        }
    }
}

/// One-indexed pagination window for [`Store::list_repos`].
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

/// A mutation applied to an existing `QueueEntry`.
#[derive(Debug, Clone)]
pub struct QueueEntryUpdate {
    /// New priority, if it changed.
    pub priority: i32,
    /// New priority reason, if it changed.
    pub priority_reason: PriorityReason,
    /// New `processed` flag.
    pub processed: bool,
    /// New `processed_at` timestamp.
    pub processed_at: Option<DateTime<Utc>>,
    /// New `last_deep_analysis_at` timestamp.
    pub last_deep_analysis_at: Option<DateTime<Utc>>,
}

/// Typed, transactional access to the data model's entities.
///
/// Implementations must uphold: snapshots are append-only; `eligible` is set
/// only by the caller (Discovery), never inferred by the store; a repo has
/// at most one unprocessed `QueueEntry` at a time (enforced by
/// `upsert_queue_entry`, not by callers).
#[async_trait]
pub trait Store: Send + Sync {
    // -- Repo --------------------------------------------------------------

    /// Insert or update a `Repo` by upstream id. `first_discovered_at` is set
    /// only on insert; `last_seen_at` is set to `now` on every call.
    async fn upsert_repo(&self, upsert: RepoUpsert, now: DateTime<Utc>) -> Result<Repo>;

    /// Fetch a repo by its internal id.
    async fn get_repo(&self, id: Uuid) -> Result<Option<Repo>>;

    /// Fetch a repo by upstream id.
    async fn get_repo_by_github_id(&self, github_id: i64) -> Result<Option<Repo>>;

    /// Fetch a repo by `owner/name`.
    async fn get_repo_by_full_name(&self, owner: &str, name: &str) -> Result<Option<Repo>>;

    /// All repos currently satisfying `eligible = true`.
    async fn list_eligible_repos(&self) -> Result<Vec<Repo>>;

    /// All repos with `created_at >= cutoff`.
    async fn list_repos_created_after(&self, cutoff: DateTime<Utc>) -> Result<Vec<Repo>>;

    /// Filtered, sorted, paginated repo listing for the read surface.
    /// Returns the page plus the total match count (pre-pagination).
    async fn list_repos(
        &self,
        filter: RepoFilter,
        sort: RepoSort,
        page: Page,
    ) -> Result<(Vec<Repo>, u64)>;

    /// Aggregate overview of the discovered universe for the read surface:
    /// total/eligible/ineligible repo counts, a top-10 language breakdown
    /// among eligible repos, and the most recent completed discovery/
    /// deep-analysis run timestamps.
    async fn universe_stats(&self) -> Result<UniverseStats>;

    // -- Snapshots -----------------------------------------------------------

    /// Append an immutable discovery snapshot.
    async fn append_discovery_snapshot(&self, snapshot: DiscoverySnapshot) -> Result<()>;

    /// The `n` most recent discovery snapshots for a repo, newest first.
    async fn latest_discovery_snapshots(&self, repo_id: Uuid, n: usize) -> Result<Vec<DiscoverySnapshot>>;

    /// The earliest discovery snapshot for a repo with `stars >= threshold`.
    async fn first_discovery_snapshot_at_or_above(
        &self,
        repo_id: Uuid,
        threshold: i64,
    ) -> Result<Option<DiscoverySnapshot>>;

    /// Append an immutable deep snapshot.
    async fn append_deep_snapshot(&self, snapshot: DeepSnapshot) -> Result<()>;

    /// The most recent deep snapshot for a repo, if any.
    async fn latest_deep_snapshot(&self, repo_id: Uuid) -> Result<Option<DeepSnapshot>>;

    /// The `n` most recent deep snapshots for a repo, newest first.
    async fn deep_snapshots_for_repo(&self, repo_id: Uuid, n: usize) -> Result<Vec<DeepSnapshot>>;

    // -- Queue ---------------------------------------------------------------

    /// The repo's current unprocessed queue entry, if any.
    async fn unprocessed_queue_entry(&self, repo_id: Uuid) -> Result<Option<QueueEntry>>;

    /// Insert a new queue entry, or update priority/reason on the existing
    /// unprocessed entry for this repo. Enforces the at-most-one-unprocessed
    /// invariant.
    async fn upsert_queue_entry(
        &self,
        repo_id: Uuid,
        priority: i32,
        priority_reason: PriorityReason,
        now: DateTime<Utc>,
    ) -> Result<QueueEntryUpsertResult>;

    /// Unprocessed entries, ordered `(priority desc, queued_at asc)`, at
    /// most `limit` of them.
    async fn unprocessed_queue_entries(&self, limit: usize) -> Result<Vec<QueueEntry>>;

    /// Apply a mutation to an existing queue entry.
    async fn update_queue_entry(&self, id: Uuid, update: QueueEntryUpdate) -> Result<()>;

    /// Delete queue entries where `processed = true` and
    /// `processed_at < cutoff`. Returns the number deleted.
    async fn delete_processed_queue_entries_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Count unprocessed entries, in total and per priority value.
    async fn queue_summary(&self) -> Result<QueueSummary>;

    // -- Job runs --------------------------------------------------------------

    /// Open a new job run with `status = running`.
    async fn start_job_run(&self, job_type: JobType, started_at: DateTime<Utc>) -> Result<JobRun>;

    /// Close a job run with a final status, stats payload, and optional
    /// error message.
    async fn finish_job_run(
        &self,
        id: Uuid,
        completed_at: DateTime<Utc>,
        status: oss_watch_core::JobStatus,
        stats: serde_json::Value,
        error_message: Option<String>,
    ) -> Result<()>;

    /// The most recent job run for each job type, for a status readout.
    async fn latest_job_runs(&self) -> Result<Vec<JobRun>>;

    // -- Watchlist -------------------------------------------------------------

    /// Append a watchlist entry.
    async fn append_watchlist_entry(&self, entry: WatchlistEntry) -> Result<()>;

    /// The most recent watchlist generation date, if any entries exist.
    async fn latest_watchlist_date(&self) -> Result<Option<DateTime<Utc>>>;

    /// Entries for a given generation date.
    async fn watchlist_entries_for_date(&self, date: DateTime<Utc>) -> Result<Vec<WatchlistEntry>>;

    /// All distinct watchlist generation dates, newest first.
    async fn watchlist_dates(&self) -> Result<Vec<DateTime<Utc>>>;
}

/// Outcome of `Store::upsert_queue_entry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEntryUpsertResult {
    /// A new entry was inserted.
    Inserted,
    /// An existing unprocessed entry's priority changed.
    PriorityUpdated,
    /// An existing unprocessed entry already had this priority; no change.
    Unchanged,
}

/// Aggregate overview of the discovered universe, as returned by
/// `Store::universe_stats`.
#[derive(Debug, Clone, Default)]
pub struct UniverseStats {
    /// All repos ever upserted.
    pub total_repos: u64,
    /// Repos with `eligible = true`.
    pub eligible_repos: u64,
    /// `total_repos - eligible_repos`.
    pub ineligible_repos: u64,
    /// Top 10 languages among eligible repos, by repo count descending.
    /// A `None` language is reported as `"unknown"`.
    pub language_counts: Vec<(String, u64)>,
    /// Completion timestamp of the most recent completed `discovery` run.
    pub last_completed_discovery_at: Option<DateTime<Utc>>,
    /// Completion timestamp of the most recent completed `deep_analysis` run.
    pub last_completed_deep_analysis_at: Option<DateTime<Utc>>,
}

/// Per-priority-class unprocessed counts, as returned by
/// `Store::queue_summary`.
#[derive(Debug, Clone, Default)]
pub struct QueueSummary {
    /// Total unprocessed entries.
    pub total: u64,
    /// Unprocessed entries with priority 10 (`newly_eligible`).
    pub newly_eligible: u64,
    /// Unprocessed entries with priority 8 (`high_momentum`).
    pub high_momentum: u64,
    /// Unprocessed entries with priority 7 (`activity_spike`).
    pub activity_spike: u64,
    /// Unprocessed entries with priority 5 (`stale`).
    pub stale: u64,
    /// Unprocessed entries with priority 3 (`regular`).
    pub regular: u64,
}
