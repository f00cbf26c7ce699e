//! `PostgreSQL`-backed `Store`, gated behind the `postgres` feature.
//!
//! Stores repos, snapshots, queue entries, job runs, and watchlist entries in
//! the schema under `migrations/`. Pooled via `deadpool-postgres`; one
//! connection is checked out per call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config as PoolConfig, Pool, Runtime};
use oss_watch_core::{
    DeepSnapshot, DiscoverySnapshot, Error, JobRun, JobStatus, JobType, PriorityReason, QueueEntry,
    Repo, Result, WatchlistEntry,
};
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

use crate::trait_def::{
    Page, QueueEntryUpdate, QueueEntryUpsertResult, QueueSummary, RepoFilter, RepoSort,
    RepoSortField, RepoUpsert, Store, UniverseStats,
};

/// `Store` implementation backed by a pooled `PostgreSQL` connection.
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Connect using a `postgres://` URL, applying the schema in
    /// `migrations/001_init.sql` if the tables don't exist yet.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let mut config = PoolConfig::new();
        config.url = Some(database_url.to_string());
        let pool = config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| Error::StoreError(e.to_string()))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        let client = self.client().await?;
        client
            .batch_execute(include_str!("../migrations/001_init.sql"))
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(())
    }

    async fn client(&self) -> Result<deadpool_postgres::Client> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::StoreError(e.to_string()))
    }

    /// Completion timestamp of the most recent completed run of `job_type_tag`.
    async fn last_completed_run_at(&self, job_type_tag: &str) -> Result<Option<DateTime<Utc>>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "select completed_at from job_runs \
                 where job_type = $1 and status = 'completed' \
                 order by completed_at desc nulls last limit 1",
                &[&job_type_tag],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(row.and_then(|r| r.get("completed_at")))
    }

    fn row_to_repo(row: &Row) -> Repo {
        Repo {
            id: row.get("id"),
            github_id: row.get("github_id"),
            owner: row.get("owner"),
            name: row.get("name"),
            full_name: row.get("full_name"),
            language: row.get("language"),
            stars: row.get("stars"),
            forks: row.get("forks"),
            created_at: row.get("created_at"),
            pushed_at: row.get("pushed_at"),
            archived: row.get("archived"),
            is_fork: row.get("is_fork"),
            first_discovered_at: row.get("first_discovered_at"),
            last_seen_at: row.get("last_seen_at"),
            eligible: row.get("eligible"),
        }
    }

    fn row_to_discovery_snapshot(row: &Row) -> Result<DiscoverySnapshot> {
        Ok(DiscoverySnapshot {
            id: row.get("id"),
            repo_id: row.get("repo_id"),
            snapshot_date: row.get("snapshot_date"),
            stars: row.get("stars"),
            forks: row.get("forks"),
            pushed_at: row.get("pushed_at"),
            eligible: row.get("eligible"),
            raw: row.get("raw"),
        })
    }

    fn row_to_deep_snapshot(row: &Row) -> Result<DeepSnapshot> {
        let contributor_health = serde_json::from_value(row.get("contributor_health"))?;
        let velocity = serde_json::from_value(row.get("velocity"))?;
        let responsiveness = serde_json::from_value(row.get("responsiveness"))?;
        let adoption = serde_json::from_value(row.get("adoption"))?;
        let community_risk = serde_json::from_value(row.get("community_risk"))?;
        Ok(DeepSnapshot {
            id: row.get("id"),
            repo_id: row.get("repo_id"),
            snapshot_date: row.get("snapshot_date"),
            contributor_health,
            velocity,
            responsiveness,
            adoption,
            community_risk,
            health_index: row.get("health_index"),
            metrics: row.get("metrics"),
        })
    }

    fn row_to_queue_entry(row: &Row) -> Result<QueueEntry> {
        let reason_tag: String = row.get("priority_reason");
        Ok(QueueEntry {
            id: row.get("id"),
            repo_id: row.get("repo_id"),
            priority: row.get("priority"),
            priority_reason: priority_reason_from_str(&reason_tag)?,
            queued_at: row.get("queued_at"),
            processed: row.get("processed"),
            processed_at: row.get("processed_at"),
            last_deep_analysis_at: row.get("last_deep_analysis_at"),
        })
    }

    fn row_to_job_run(row: &Row) -> Result<JobRun> {
        let job_type_tag: String = row.get("job_type");
        let status_tag: String = row.get("status");
        Ok(JobRun {
            id: row.get("id"),
            job_type: job_type_from_str(&job_type_tag)?,
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
            status: job_status_from_str(&status_tag)?,
            stats: row.get("stats"),
            error_message: row.get("error_message"),
        })
    }

    fn row_to_watchlist_entry(row: &Row) -> WatchlistEntry {
        WatchlistEntry {
            id: row.get("id"),
            repo_id: row.get("repo_id"),
            watchlist_date: row.get("watchlist_date"),
            momentum_score: row.get("momentum_score"),
            durability_score: row.get("durability_score"),
            adoption_score: row.get("adoption_score"),
            rationale: row.get("rationale"),
            metrics_snapshot: row.get("metrics_snapshot"),
        }
    }
}

fn priority_reason_from_str(s: &str) -> Result<PriorityReason> {
    Ok(match s {
        "newly_eligible" => PriorityReason::NewlyEligible,
        "high_momentum" => PriorityReason::HighMomentum,
        "activity_spike" => PriorityReason::ActivitySpike,
        "stale" => PriorityReason::Stale,
        "regular" => PriorityReason::Regular,
        other => return Err(Error::StoreError(format!("unknown priority_reason {other}"))),
    })
}

fn job_type_from_str(s: &str) -> Result<JobType> {
    Ok(match s {
        "discovery" => JobType::Discovery,
        "queue_refresh" => JobType::QueueRefresh,
        "deep_analysis" => JobType::DeepAnalysis,
        "watchlist" => JobType::Watchlist,
        other => return Err(Error::StoreError(format!("unknown job_type {other}"))),
    })
}

fn job_status_from_str(s: &str) -> Result<JobStatus> {
    Ok(match s {
        "running" => JobStatus::Running,
        "completed" => JobStatus::Completed,
        "failed" => JobStatus::Failed,
        other => return Err(Error::StoreError(format!("unknown job status {other}"))),
    })
}

#[async_trait]
impl Store for PostgresStore {
    async fn upsert_repo(&self, upsert: RepoUpsert, now: DateTime<Utc>) -> Result<Repo> {
        let client = self.client().await?;
        let full_name = Repo::full_name(&upsert.owner, &upsert.name);
        let row = client
            .query_one(
                "insert into repos (id, github_id, owner, name, full_name, language, stars, \
                 forks, created_at, pushed_at, archived, is_fork, first_discovered_at, \
                 last_seen_at, eligible) \
                 values (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12, $13) \
                 on conflict (github_id) do update set \
                   owner = excluded.owner, name = excluded.name, full_name = excluded.full_name, \
                   language = excluded.language, stars = excluded.stars, forks = excluded.forks, \
                   pushed_at = excluded.pushed_at, archived = excluded.archived, \
                   is_fork = excluded.is_fork, last_seen_at = $12, eligible = excluded.eligible \
                 returning *",
                &[
                    &upsert.github_id,
                    &upsert.owner,
                    &upsert.name,
                    &full_name,
                    &upsert.language,
                    &upsert.stars,
                    &upsert.forks,
                    &upsert.created_at,
                    &upsert.pushed_at,
                    &upsert.archived,
                    &upsert.is_fork,
                    &now,
                    &upsert.eligible,
                ],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(Self::row_to_repo(&row))
    }

    async fn get_repo(&self, id: Uuid) -> Result<Option<Repo>> {
        let client = self.client().await?;
        let row = client
            .query_opt("select * from repos where id = $1", &[&id])
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(row.as_ref().map(Self::row_to_repo))
    }

    async fn get_repo_by_github_id(&self, github_id: i64) -> Result<Option<Repo>> {
        let client = self.client().await?;
        let row = client
            .query_opt("select * from repos where github_id = $1", &[&github_id])
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(row.as_ref().map(Self::row_to_repo))
    }

    async fn get_repo_by_full_name(&self, owner: &str, name: &str) -> Result<Option<Repo>> {
        let client = self.client().await?;
        let full_name = Repo::full_name(owner, name);
        let row = client
            .query_opt("select * from repos where full_name = $1", &[&full_name])
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(row.as_ref().map(Self::row_to_repo))
    }

    async fn list_eligible_repos(&self) -> Result<Vec<Repo>> {
        let client = self.client().await?;
        let rows = client
            .query("select * from repos where eligible", &[])
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(rows.iter().map(Self::row_to_repo).collect())
    }

    async fn list_repos_created_after(&self, cutoff: DateTime<Utc>) -> Result<Vec<Repo>> {
        let client = self.client().await?;
        let rows = client
            .query("select * from repos where created_at >= $1", &[&cutoff])
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(rows.iter().map(Self::row_to_repo).collect())
    }

    async fn list_repos(
        &self,
        filter: RepoFilter,
        sort: RepoSort,
        page: Page,
    ) -> Result<(Vec<Repo>, u64)> {
        let client = self.client().await?;

        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(language) = &filter.language {
            params.push(language);
            conditions.push(format!("language = ${}", params.len()));
        }
        if let Some(min_stars) = &filter.min_stars {
            params.push(min_stars);
            conditions.push(format!("stars >= ${}", params.len()));
        }
        if let Some(max_stars) = &filter.max_stars {
            params.push(max_stars);
            conditions.push(format!("stars <= ${}", params.len()));
        }
        if let Some(eligible) = &filter.eligible {
            params.push(eligible);
            conditions.push(format!("eligible = ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("where {}", conditions.join(" and "))
        };

        let count_row = client
            .query_one(
                &format!("select count(*) as n from repos {where_clause}"),
                &params,
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        let total: i64 = count_row.get("n");

        let sort_column = match sort.field {
            RepoSortField::Stars => "stars",
            RepoSortField::CreatedAt => "created_at",
            RepoSortField::PushedAt => "pushed_at",
        };
        let direction = if sort.descending { "desc" } else { "asc" };

        let limit = i64::from(page.per_page.max(1));
        let offset = i64::from(page.page.saturating_sub(1)) * limit;
        params.push(&limit);
        let limit_idx = params.len();
        params.push(&offset);
        let offset_idx = params.len();

        let rows = client
            .query(
                &format!(
                    "select * from repos {where_clause} order by {sort_column} {direction} \
                     limit ${limit_idx} offset ${offset_idx}"
                ),
                &params,
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;

        Ok((rows.iter().map(Self::row_to_repo).collect(), total as u64))
    }

    async fn universe_stats(&self) -> Result<UniverseStats> {
        let client = self.client().await?;

        let counts_row = client
            .query_one(
                "select count(*) as total, \
                 count(*) filter (where eligible) as eligible \
                 from repos",
                &[],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        let total_repos: i64 = counts_row.get("total");
        let eligible_repos: i64 = counts_row.get("eligible");

        let language_rows = client
            .query(
                "select coalesce(language, 'unknown') as language, count(*) as n \
                 from repos where eligible \
                 group by language order by n desc, language asc limit 10",
                &[],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        let language_counts = language_rows
            .iter()
            .map(|row| {
                let language: String = row.get("language");
                let n: i64 = row.get("n");
                (language, n as u64)
            })
            .collect();

        let last_completed_discovery_at = self.last_completed_run_at("discovery").await?;
        let last_completed_deep_analysis_at = self.last_completed_run_at("deep_analysis").await?;

        Ok(UniverseStats {
            total_repos: total_repos as u64,
            eligible_repos: eligible_repos as u64,
            ineligible_repos: (total_repos - eligible_repos) as u64,
            language_counts,
            last_completed_discovery_at,
            last_completed_deep_analysis_at,
        })
    }

    async fn append_discovery_snapshot(&self, snapshot: DiscoverySnapshot) -> Result<()> {
        let client = self.client().await?;
        client
            .execute(
                "insert into discovery_snapshots \
                 (id, repo_id, snapshot_date, stars, forks, pushed_at, eligible, raw) \
                 values ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &snapshot.id,
                    &snapshot.repo_id,
                    &snapshot.snapshot_date,
                    &snapshot.stars,
                    &snapshot.forks,
                    &snapshot.pushed_at,
                    &snapshot.eligible,
                    &snapshot.raw,
                ],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(())
    }

    async fn latest_discovery_snapshots(
        &self,
        repo_id: Uuid,
        n: usize,
    ) -> Result<Vec<DiscoverySnapshot>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "select * from discovery_snapshots where repo_id = $1 \
                 order by snapshot_date desc limit $2",
                &[&repo_id, &(n as i64)],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        rows.iter().map(Self::row_to_discovery_snapshot).collect()
    }

    async fn first_discovery_snapshot_at_or_above(
        &self,
        repo_id: Uuid,
        threshold: i64,
    ) -> Result<Option<DiscoverySnapshot>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "select * from discovery_snapshots where repo_id = $1 and stars >= $2 \
                 order by snapshot_date asc limit 1",
                &[&repo_id, &threshold],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        row.as_ref().map(Self::row_to_discovery_snapshot).transpose()
    }

    async fn append_deep_snapshot(&self, snapshot: DeepSnapshot) -> Result<()> {
        let client = self.client().await?;
        client
            .execute(
                "insert into deep_snapshots \
                 (id, repo_id, snapshot_date, contributor_health, velocity, responsiveness, \
                  adoption, community_risk, health_index, metrics) \
                 values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                &[
                    &snapshot.id,
                    &snapshot.repo_id,
                    &snapshot.snapshot_date,
                    &serde_json::to_value(&snapshot.contributor_health)?,
                    &serde_json::to_value(&snapshot.velocity)?,
                    &serde_json::to_value(&snapshot.responsiveness)?,
                    &serde_json::to_value(&snapshot.adoption)?,
                    &serde_json::to_value(&snapshot.community_risk)?,
                    &snapshot.health_index,
                    &snapshot.metrics,
                ],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(())
    }

    async fn latest_deep_snapshot(&self, repo_id: Uuid) -> Result<Option<DeepSnapshot>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "select * from deep_snapshots where repo_id = $1 \
                 order by snapshot_date desc limit 1",
                &[&repo_id],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        row.as_ref().map(Self::row_to_deep_snapshot).transpose()
    }

    async fn deep_snapshots_for_repo(&self, repo_id: Uuid, n: usize) -> Result<Vec<DeepSnapshot>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "select * from deep_snapshots where repo_id = $1 \
                 order by snapshot_date desc limit $2",
                &[&repo_id, &(n as i64)],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        rows.iter().map(Self::row_to_deep_snapshot).collect()
    }

    async fn unprocessed_queue_entry(&self, repo_id: Uuid) -> Result<Option<QueueEntry>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "select * from queue_entries where repo_id = $1 and not processed",
                &[&repo_id],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        row.as_ref().map(Self::row_to_queue_entry).transpose()
    }

    async fn upsert_queue_entry(
        &self,
        repo_id: Uuid,
        priority: i32,
        priority_reason: PriorityReason,
        now: DateTime<Utc>,
    ) -> Result<QueueEntryUpsertResult> {
        let client = self.client().await?;
        let existing = client
            .query_opt(
                "select id, priority from queue_entries where repo_id = $1 and not processed",
                &[&repo_id],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;

        if let Some(row) = existing {
            let id: Uuid = row.get("id");
            let current_priority: i32 = row.get("priority");
            if current_priority == priority {
                return Ok(QueueEntryUpsertResult::Unchanged);
            }
            client
                .execute(
                    "update queue_entries set priority = $1, priority_reason = $2 where id = $3",
                    &[&priority, &priority_reason.as_str(), &id],
                )
                .await
                .map_err(|e| Error::StoreError(e.to_string()))?;
            return Ok(QueueEntryUpsertResult::PriorityUpdated);
        }

        client
            .execute(
                "insert into queue_entries \
                 (id, repo_id, priority, priority_reason, queued_at, processed) \
                 values (gen_random_uuid(), $1, $2, $3, $4, false)",
                &[&repo_id, &priority, &priority_reason.as_str(), &now],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(QueueEntryUpsertResult::Inserted)
    }

    async fn unprocessed_queue_entries(&self, limit: usize) -> Result<Vec<QueueEntry>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "select * from queue_entries where not processed \
                 order by priority desc, queued_at asc limit $1",
                &[&(limit as i64)],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        rows.iter().map(Self::row_to_queue_entry).collect()
    }

    async fn update_queue_entry(&self, id: Uuid, update: QueueEntryUpdate) -> Result<()> {
        let client = self.client().await?;
        let affected = client
            .execute(
                "update queue_entries set priority = $1, priority_reason = $2, processed = $3, \
                 processed_at = $4, last_deep_analysis_at = $5 where id = $6",
                &[
                    &update.priority,
                    &update.priority_reason.as_str(),
                    &update.processed,
                    &update.processed_at,
                    &update.last_deep_analysis_at,
                    &id,
                ],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        if affected == 0 {
            return Err(Error::NotFound(format!("queue entry {id}")));
        }
        Ok(())
    }

    async fn delete_processed_queue_entries_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let client = self.client().await?;
        let affected = client
            .execute(
                "delete from queue_entries where processed and processed_at < $1",
                &[&cutoff],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(affected)
    }

    async fn queue_summary(&self) -> Result<QueueSummary> {
        let client = self.client().await?;
        let rows = client
            .query(
                "select priority_reason, count(*) as n from queue_entries \
                 where not processed group by priority_reason",
                &[],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;

        let mut summary = QueueSummary::default();
        for row in rows {
            let tag: String = row.get("priority_reason");
            let n: i64 = row.get("n");
            let n = n as u64;
            summary.total += n;
            match priority_reason_from_str(&tag)? {
                PriorityReason::NewlyEligible => summary.newly_eligible = n,
                PriorityReason::HighMomentum => summary.high_momentum = n,
                PriorityReason::ActivitySpike => summary.activity_spike = n,
                PriorityReason::Stale => summary.stale = n,
                PriorityReason::Regular => summary.regular = n,
            }
        }
        Ok(summary)
    }

    async fn start_job_run(&self, job_type: JobType, started_at: DateTime<Utc>) -> Result<JobRun> {
        let client = self.client().await?;
        let job_type_tag = match job_type {
            JobType::Discovery => "discovery",
            JobType::QueueRefresh => "queue_refresh",
            JobType::DeepAnalysis => "deep_analysis",
            JobType::Watchlist => "watchlist",
        };
        let row = client
            .query_one(
                "insert into job_runs (id, job_type, started_at, status, stats) \
                 values (gen_random_uuid(), $1, $2, 'running', 'null'::jsonb) returning *",
                &[&job_type_tag, &started_at],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Self::row_to_job_run(&row)
    }

    async fn finish_job_run(
        &self,
        id: Uuid,
        completed_at: DateTime<Utc>,
        status: JobStatus,
        stats: serde_json::Value,
        error_message: Option<String>,
    ) -> Result<()> {
        let client = self.client().await?;
        let status_tag = match status {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        let affected = client
            .execute(
                "update job_runs set completed_at = $1, status = $2, stats = $3, \
                 error_message = $4 where id = $5",
                &[&completed_at, &status_tag, &stats, &error_message, &id],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        if affected == 0 {
            return Err(Error::NotFound(format!("job run {id}")));
        }
        Ok(())
    }

    async fn latest_job_runs(&self) -> Result<Vec<JobRun>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "select distinct on (job_type) * from job_runs \
                 order by job_type, started_at desc",
                &[],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        rows.iter().map(Self::row_to_job_run).collect()
    }

    async fn append_watchlist_entry(&self, entry: WatchlistEntry) -> Result<()> {
        let client = self.client().await?;
        client
            .execute(
                "insert into watchlist_entries \
                 (id, repo_id, watchlist_date, momentum_score, durability_score, \
                  adoption_score, rationale, metrics_snapshot) \
                 values ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &entry.id,
                    &entry.repo_id,
                    &entry.watchlist_date,
                    &entry.momentum_score,
                    &entry.durability_score,
                    &entry.adoption_score,
                    &entry.rationale,
                    &entry.metrics_snapshot,
                ],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(())
    }

    async fn latest_watchlist_date(&self) -> Result<Option<DateTime<Utc>>> {
        let client = self.client().await?;
        let row = client
            .query_opt("select max(watchlist_date) as d from watchlist_entries", &[])
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(row.and_then(|r| r.get("d")))
    }

    async fn watchlist_entries_for_date(&self, date: DateTime<Utc>) -> Result<Vec<WatchlistEntry>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "select * from watchlist_entries where watchlist_date = $1",
                &[&date],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(rows.iter().map(Self::row_to_watchlist_entry).collect())
    }

    async fn watchlist_dates(&self) -> Result<Vec<DateTime<Utc>>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "select distinct watchlist_date from watchlist_entries order by watchlist_date desc",
                &[],
            )
            .await
            .map_err(|e| Error::StoreError(e.to_string()))?;
        Ok(rows.iter().map(|r| r.get("watchlist_date")).collect())
    }
}
