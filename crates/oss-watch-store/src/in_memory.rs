//! Process-local `Store` implementation backed by `tokio::sync::RwLock`
//! guarded collections. Used for tests and for single-process deployments
//! that don't need durability across restarts.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oss_watch_core::{
    DeepSnapshot, DiscoverySnapshot, Error, JobRun, JobStatus, JobType, PriorityReason, QueueEntry,
    Repo, Result, WatchlistEntry,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::trait_def::{
    Page, QueueEntryUpdate, QueueEntryUpsertResult, QueueSummary, RepoFilter, RepoSort,
    RepoSortField, RepoUpsert, Store, UniverseStats,
};

#[derive(Default)]
struct Inner {
    repos: HashMap<Uuid, Repo>,
    repos_by_github_id: HashMap<i64, Uuid>,
    discovery_snapshots: HashMap<Uuid, Vec<DiscoverySnapshot>>,
    deep_snapshots: HashMap<Uuid, Vec<DeepSnapshot>>,
    queue_entries: HashMap<Uuid, QueueEntry>,
    job_runs: HashMap<Uuid, JobRun>,
    watchlist_entries: Vec<WatchlistEntry>,
}

/// In-memory `Store`. Cheap to construct; cloning the handle shares state
/// (it's an `Arc` internally via the lock, not a deep copy).
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    /// A fresh, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_repo(&self, upsert: RepoUpsert, now: DateTime<Utc>) -> Result<Repo> {
        let mut inner = self.inner.write().await;
        if let Some(&id) = inner.repos_by_github_id.get(&upsert.github_id) {
            let repo = inner.repos.get_mut(&id).expect("repos/index desync");
            repo.owner = upsert.owner;
            repo.name = upsert.name.clone();
            repo.full_name = Repo::full_name(&repo.owner, &upsert.name);
            repo.language = upsert.language;
            repo.stars = upsert.stars;
            repo.forks = upsert.forks;
            repo.pushed_at = upsert.pushed_at;
            repo.archived = upsert.archived;
            repo.is_fork = upsert.is_fork;
            repo.eligible = upsert.eligible;
            repo.last_seen_at = now;
            return Ok(repo.clone());
        }

        let id = Uuid::new_v4();
        let full_name = Repo::full_name(&upsert.owner, &upsert.name);
        let repo = Repo {
            id,
            github_id: upsert.github_id,
            owner: upsert.owner,
            name: upsert.name,
            full_name,
            language: upsert.language,
            stars: upsert.stars,
            forks: upsert.forks,
            created_at: upsert.created_at,
            pushed_at: upsert.pushed_at,
            archived: upsert.archived,
            is_fork: upsert.is_fork,
            first_discovered_at: now,
            last_seen_at: now,
            eligible: upsert.eligible,
        };
        inner.repos_by_github_id.insert(repo.github_id, id);
        inner.repos.insert(id, repo.clone());
        Ok(repo)
    }

    async fn get_repo(&self, id: Uuid) -> Result<Option<Repo>> {
        Ok(self.inner.read().await.repos.get(&id).cloned())
    }

    async fn get_repo_by_github_id(&self, github_id: i64) -> Result<Option<Repo>> {
        let inner = self.inner.read().await;
        Ok(inner
            .repos_by_github_id
            .get(&github_id)
            .and_then(|id| inner.repos.get(id))
            .cloned())
    }

    async fn get_repo_by_full_name(&self, owner: &str, name: &str) -> Result<Option<Repo>> {
        let target = Repo::full_name(owner, name);
        Ok(self
            .inner
            .read()
            .await
            .repos
            .values()
            .find(|r| r.full_name == target)
            .cloned())
    }

    async fn list_eligible_repos(&self) -> Result<Vec<Repo>> {
        Ok(self
            .inner
            .read()
            .await
            .repos
            .values()
            .filter(|r| r.eligible)
            .cloned()
            .collect())
    }

    async fn list_repos_created_after(&self, cutoff: DateTime<Utc>) -> Result<Vec<Repo>> {
        Ok(self
            .inner
            .read()
            .await
            .repos
            .values()
            .filter(|r| r.created_at >= cutoff)
            .cloned()
            .collect())
    }

    async fn list_repos(
        &self,
        filter: RepoFilter,
        sort: RepoSort,
        page: Page,
    ) -> Result<(Vec<Repo>, u64)> {
        let inner = self.inner.read().await;
        let mut matching: Vec<Repo> = inner
            .repos
            .values()
            .filter(|r| {
                filter
                    .language
                    .as_deref()
                    .map_or(true, |l| r.language.as_deref() == Some(l))
            })
            .filter(|r| filter.min_stars.map_or(true, |min| r.stars >= min))
            .filter(|r| filter.max_stars.map_or(true, |max| r.stars <= max))
            .filter(|r| filter.eligible.map_or(true, |e| r.eligible == e))
            .cloned()
            .collect();

        match sort.field {
            RepoSortField::Stars => matching.sort_by_key(|r| r.stars),
            RepoSortField::CreatedAt => matching.sort_by_key(|r| r.created_at),
            RepoSortField::PushedAt => matching.sort_by_key(|r| r.pushed_at),
        }
        if sort.descending {
            matching.reverse();
        }

        let total = matching.len() as u64;
        let per_page = page.per_page.max(1) as usize;
        let start = (page.page.saturating_sub(1) as usize) * per_page;
        let page_items = matching.into_iter().skip(start).take(per_page).collect();

        Ok((page_items, total))
    }

    async fn universe_stats(&self) -> Result<UniverseStats> {
        let inner = self.inner.read().await;

        let total_repos = inner.repos.len() as u64;
        let eligible_repos = inner.repos.values().filter(|r| r.eligible).count() as u64;

        let mut by_language: HashMap<String, u64> = HashMap::new();
        for repo in inner.repos.values().filter(|r| r.eligible) {
            let language = repo.language.clone().unwrap_or_else(|| "unknown".to_string());
            *by_language.entry(language).or_insert(0) += 1;
        }
        let mut language_counts: Vec<(String, u64)> = by_language.into_iter().collect();
        language_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        language_counts.truncate(10);

        let last_completed = |job_type: JobType| {
            inner
                .job_runs
                .values()
                .filter(|r| r.job_type == job_type && r.status == JobStatus::Completed)
                .filter_map(|r| r.completed_at)
                .max()
        };

        Ok(UniverseStats {
            total_repos,
            eligible_repos,
            ineligible_repos: total_repos - eligible_repos,
            language_counts,
            last_completed_discovery_at: last_completed(JobType::Discovery),
            last_completed_deep_analysis_at: last_completed(JobType::DeepAnalysis),
        })
    }

    async fn append_discovery_snapshot(&self, snapshot: DiscoverySnapshot) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .discovery_snapshots
            .entry(snapshot.repo_id)
            .or_default()
            .push(snapshot);
        Ok(())
    }

    async fn latest_discovery_snapshots(
        &self,
        repo_id: Uuid,
        n: usize,
    ) -> Result<Vec<DiscoverySnapshot>> {
        let inner = self.inner.read().await;
        let Some(snapshots) = inner.discovery_snapshots.get(&repo_id) else {
            return Ok(Vec::new());
        };
        let mut sorted: Vec<DiscoverySnapshot> = snapshots.clone();
        sorted.sort_by(|a, b| b.snapshot_date.cmp(&a.snapshot_date));
        sorted.truncate(n);
        Ok(sorted)
    }

    async fn first_discovery_snapshot_at_or_above(
        &self,
        repo_id: Uuid,
        threshold: i64,
    ) -> Result<Option<DiscoverySnapshot>> {
        let inner = self.inner.read().await;
        let Some(snapshots) = inner.discovery_snapshots.get(&repo_id) else {
            return Ok(None);
        };
        Ok(snapshots
            .iter()
            .filter(|s| s.stars >= threshold)
            .min_by_key(|s| s.snapshot_date)
            .cloned())
    }

    async fn append_deep_snapshot(&self, snapshot: DeepSnapshot) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .deep_snapshots
            .entry(snapshot.repo_id)
            .or_default()
            .push(snapshot);
        Ok(())
    }

    async fn latest_deep_snapshot(&self, repo_id: Uuid) -> Result<Option<DeepSnapshot>> {
        let inner = self.inner.read().await;
        Ok(inner
            .deep_snapshots
            .get(&repo_id)
            .and_then(|snapshots| snapshots.iter().max_by_key(|s| s.snapshot_date))
            .cloned())
    }

    async fn deep_snapshots_for_repo(&self, repo_id: Uuid, n: usize) -> Result<Vec<DeepSnapshot>> {
        let inner = self.inner.read().await;
        let Some(snapshots) = inner.deep_snapshots.get(&repo_id) else {
            return Ok(Vec::new());
        };
        let mut sorted: Vec<DeepSnapshot> = snapshots.clone();
        sorted.sort_by(|a, b| b.snapshot_date.cmp(&a.snapshot_date));
        sorted.truncate(n);
        Ok(sorted)
    }

    async fn unprocessed_queue_entry(&self, repo_id: Uuid) -> Result<Option<QueueEntry>> {
        Ok(self
            .inner
            .read()
            .await
            .queue_entries
            .values()
            .find(|e| e.repo_id == repo_id && !e.processed)
            .cloned())
    }

    async fn upsert_queue_entry(
        &self,
        repo_id: Uuid,
        priority: i32,
        priority_reason: PriorityReason,
        now: DateTime<Utc>,
    ) -> Result<QueueEntryUpsertResult> {
        let mut inner = self.inner.write().await;
        let existing_id = inner
            .queue_entries
            .values()
            .find(|e| e.repo_id == repo_id && !e.processed)
            .map(|e| e.id);

        if let Some(id) = existing_id {
            let entry = inner.queue_entries.get_mut(&id).expect("queue/id desync");
            if entry.priority == priority {
                return Ok(QueueEntryUpsertResult::Unchanged);
            }
            entry.priority = priority;
            entry.priority_reason = priority_reason;
            return Ok(QueueEntryUpsertResult::PriorityUpdated);
        }

        let entry = QueueEntry {
            id: Uuid::new_v4(),
            repo_id,
            priority,
            priority_reason,
            queued_at: now,
            processed: false,
            processed_at: None,
            last_deep_analysis_at: None,
        };
        inner.queue_entries.insert(entry.id, entry);
        Ok(QueueEntryUpsertResult::Inserted)
    }

    async fn unprocessed_queue_entries(&self, limit: usize) -> Result<Vec<QueueEntry>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<QueueEntry> = inner
            .queue_entries
            .values()
            .filter(|e| !e.processed)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.queued_at.cmp(&b.queued_at))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    async fn update_queue_entry(&self, id: Uuid, update: QueueEntryUpdate) -> Result<()> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .queue_entries
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("queue entry {id}")))?;
        entry.priority = update.priority;
        entry.priority_reason = update.priority_reason;
        entry.processed = update.processed;
        entry.processed_at = update.processed_at;
        entry.last_deep_analysis_at = update.last_deep_analysis_at;
        Ok(())
    }

    async fn delete_processed_queue_entries_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.queue_entries.len();
        inner.queue_entries.retain(|_, e| {
            !(e.processed && e.processed_at.map(|t| t < cutoff).unwrap_or(false))
        });
        Ok((before - inner.queue_entries.len()) as u64)
    }

    async fn queue_summary(&self) -> Result<QueueSummary> {
        let inner = self.inner.read().await;
        let mut summary = QueueSummary::default();
        for entry in inner.queue_entries.values().filter(|e| !e.processed) {
            summary.total += 1;
            match entry.priority_reason {
                PriorityReason::NewlyEligible => summary.newly_eligible += 1,
                PriorityReason::HighMomentum => summary.high_momentum += 1,
                PriorityReason::ActivitySpike => summary.activity_spike += 1,
                PriorityReason::Stale => summary.stale += 1,
                PriorityReason::Regular => summary.regular += 1,
            }
        }
        Ok(summary)
    }

    async fn start_job_run(&self, job_type: JobType, started_at: DateTime<Utc>) -> Result<JobRun> {
        let run = JobRun {
            id: Uuid::new_v4(),
            job_type,
            started_at,
            completed_at: None,
            status: JobStatus::Running,
            stats: serde_json::Value::Null,
            error_message: None,
        };
        self.inner
            .write()
            .await
            .job_runs
            .insert(run.id, run.clone());
        Ok(run)
    }

    async fn finish_job_run(
        &self,
        id: Uuid,
        completed_at: DateTime<Utc>,
        status: JobStatus,
        stats: serde_json::Value,
        error_message: Option<String>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let run = inner
            .job_runs
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("job run {id}")))?;
        run.completed_at = Some(completed_at);
        run.status = status;
        run.stats = stats;
        run.error_message = error_message;
        Ok(())
    }

    async fn latest_job_runs(&self) -> Result<Vec<JobRun>> {
        let inner = self.inner.read().await;
        let mut by_type: HashMap<JobType, JobRun> = HashMap::new();
        for run in inner.job_runs.values() {
            by_type
                .entry(run.job_type)
                .and_modify(|existing| {
                    if run.started_at > existing.started_at {
                        *existing = run.clone();
                    }
                })
                .or_insert_with(|| run.clone());
        }
        Ok(by_type.into_values().collect())
    }

    async fn append_watchlist_entry(&self, entry: WatchlistEntry) -> Result<()> {
        self.inner.write().await.watchlist_entries.push(entry);
        Ok(())
    }

    async fn latest_watchlist_date(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .inner
            .read()
            .await
            .watchlist_entries
            .iter()
            .map(|e| e.watchlist_date)
            .max())
    }

    async fn watchlist_entries_for_date(&self, date: DateTime<Utc>) -> Result<Vec<WatchlistEntry>> {
        Ok(self
            .inner
            .read()
            .await
            .watchlist_entries
            .iter()
            .filter(|e| e.watchlist_date == date)
            .cloned()
            .collect())
    }

    async fn watchlist_dates(&self) -> Result<Vec<DateTime<Utc>>> {
        let inner = self.inner.read().await;
        let mut dates: Vec<DateTime<Utc>> = inner
            .watchlist_entries
            .iter()
            .map(|e| e.watchlist_date)
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_upsert(github_id: i64) -> RepoUpsert {
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        RepoUpsert {
            github_id,
            owner: "octocat".to_string(),
            name: "hello-world".to_string(),
            language: Some("Rust".to_string()),
            stars: 2500,
            forks: 100,
            created_at: t,
            pushed_at: t,
            archived: false,
            is_fork: false,
            eligible: true,
        }
    }

    #[tokio::test]
    async fn test_upsert_repo_inserts_then_updates() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let first = store.upsert_repo(sample_upsert(1), now).await.unwrap();
        assert_eq!(first.stars, 2500);

        let mut second_upsert = sample_upsert(1);
        second_upsert.stars = 3000;
        let second = store.upsert_repo(second_upsert, now).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.stars, 3000);

        let all = store.list_eligible_repos().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_queue_entry_at_most_one_unprocessed() {
        let store = InMemoryStore::new();
        let repo_id = Uuid::new_v4();
        let now = Utc::now();

        let first = store
            .upsert_queue_entry(repo_id, 5, PriorityReason::Stale, now)
            .await
            .unwrap();
        assert_eq!(first, QueueEntryUpsertResult::Inserted);

        let second = store
            .upsert_queue_entry(repo_id, 10, PriorityReason::NewlyEligible, now)
            .await
            .unwrap();
        assert_eq!(second, QueueEntryUpsertResult::PriorityUpdated);

        let entries = store.unprocessed_queue_entries(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].priority, 10);
    }

    #[tokio::test]
    async fn test_unprocessed_queue_entries_ordering() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store
            .upsert_queue_entry(Uuid::new_v4(), 3, PriorityReason::Regular, now)
            .await
            .unwrap();
        store
            .upsert_queue_entry(Uuid::new_v4(), 10, PriorityReason::NewlyEligible, now)
            .await
            .unwrap();
        store
            .upsert_queue_entry(
                Uuid::new_v4(),
                10,
                PriorityReason::NewlyEligible,
                now + chrono::Duration::seconds(1),
            )
            .await
            .unwrap();

        let entries = store.unprocessed_queue_entries(10).await.unwrap();
        assert_eq!(entries[0].priority, 10);
        assert_eq!(entries[1].priority, 10);
        assert!(entries[0].queued_at <= entries[1].queued_at);
        assert_eq!(entries[2].priority, 3);
    }

    #[tokio::test]
    async fn test_job_run_lifecycle() {
        let store = InMemoryStore::new();
        let started = Utc::now();
        let run = store
            .start_job_run(JobType::Discovery, started)
            .await
            .unwrap();
        assert_eq!(run.status, JobStatus::Running);

        store
            .finish_job_run(
                run.id,
                started + chrono::Duration::seconds(5),
                JobStatus::Completed,
                serde_json::json!({"repos_seen": 10}),
                None,
            )
            .await
            .unwrap();

        let latest = store.latest_job_runs().await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_list_repos_filters_sorts_and_paginates() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        for (github_id, stars, language) in [
            (1, 1000, "Rust"),
            (2, 2000, "Rust"),
            (3, 3000, "Go"),
            (4, 4000, "Rust"),
        ] {
            let mut upsert = sample_upsert(github_id);
            upsert.stars = stars;
            upsert.language = Some(language.to_string());
            store.upsert_repo(upsert, now).await.unwrap();
        }

        let (page, total) = store
            .list_repos(
                RepoFilter {
                    language: Some("Rust".to_string()),
                    ..Default::default()
                },
                RepoSort {
                    field: RepoSortField::Stars,
                    descending: true,
                },
                Page {
                    page: 1,
                    per_page: 2,
                },
            )
            .await
            .unwrap();

        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].stars, 4000);
        assert_eq!(page[1].stars, 2000);

        let (second_page, _) = store
            .list_repos(
                RepoFilter {
                    language: Some("Rust".to_string()),
                    ..Default::default()
                },
                RepoSort {
                    field: RepoSortField::Stars,
                    descending: true,
                },
                Page {
                    page: 2,
                    per_page: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].stars, 1000);
    }

    #[tokio::test]
    async fn test_watchlist_dates_distinct_and_sorted() {
        let store = InMemoryStore::new();
        let d1 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let d2 = Utc.with_ymd_and_hms(2026, 1, 8, 0, 0, 0).unwrap();
        for date in [d1, d2, d2] {
            store
                .append_watchlist_entry(WatchlistEntry {
                    id: Uuid::new_v4(),
                    repo_id: Uuid::new_v4(),
                    watchlist_date: date,
                    momentum_score: 50.0,
                    durability_score: 50.0,
                    adoption_score: 50.0,
                    rationale: "test".to_string(),
                    metrics_snapshot: serde_json::Value::Null,
                })
                .await
                .unwrap();
        }

        let dates = store.watchlist_dates().await.unwrap();
        assert_eq!(dates, vec![d2, d1]);
    }

    #[tokio::test]
    async fn test_universe_stats_counts_and_language_breakdown() {
        let store = InMemoryStore::new();
        let now = Utc::now();

        for (github_id, language, eligible) in [
            (1, Some("Rust"), true),
            (2, Some("Rust"), true),
            (3, Some("Go"), true),
            (4, None, true),
            (5, Some("Go"), false),
        ] {
            let mut upsert = sample_upsert(github_id);
            upsert.language = language.map(str::to_string);
            upsert.eligible = eligible;
            store.upsert_repo(upsert, now).await.unwrap();
        }

        let stats = store.universe_stats().await.unwrap();
        assert_eq!(stats.total_repos, 5);
        assert_eq!(stats.eligible_repos, 4);
        assert_eq!(stats.ineligible_repos, 1);
        assert_eq!(
            stats.language_counts,
            vec![
                ("Rust".to_string(), 2),
                ("Go".to_string(), 1),
                ("unknown".to_string(), 1),
            ]
        );
        assert!(stats.last_completed_discovery_at.is_none());
    }

    #[tokio::test]
    async fn test_universe_stats_reports_last_completed_runs() {
        let store = InMemoryStore::new();
        let started = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let completed = Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap();

        let job = store.start_job_run(JobType::Discovery, started).await.unwrap();
        store
            .finish_job_run(job.id, completed, JobStatus::Completed, serde_json::json!({}), None)
            .await
            .unwrap();

        let failed_job = store.start_job_run(JobType::DeepAnalysis, started).await.unwrap();
        store
            .finish_job_run(
                failed_job.id,
                completed,
                JobStatus::Failed,
                serde_json::json!({}),
                Some("boom".to_string()),
            )
            .await
            .unwrap();

        let stats = store.universe_stats().await.unwrap();
        assert_eq!(stats.last_completed_discovery_at, Some(completed));
        assert_eq!(stats.last_completed_deep_analysis_at, None);
    }
}
