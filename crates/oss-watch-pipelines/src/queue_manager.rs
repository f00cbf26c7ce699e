//! QueueManager: maintains a prioritized backlog of repos awaiting deep
//! analysis.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use oss_watch_core::{DeepSnapshot, DiscoverySnapshot, PriorityReason, Repo, Result};
use oss_watch_store::{QueueEntryUpsertResult, QueueSummary, Store};
use serde::Serialize;

const PROCESSED_RETENTION_DAYS: i64 = 7;
const NEWLY_ELIGIBLE_WINDOW_DAYS: i64 = 14;
const HIGH_MOMENTUM_STARS_PER_DAY: f64 = 10.0;
const ACTIVITY_SPIKE_WINDOW_DAYS: i64 = 3;
const STALE_DEEP_SNAPSHOT_DAYS: i64 = 30;

/// Stats returned from `QueueManager::refresh_queue`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueRefreshStats {
    /// Processed entries deleted for being older than the retention window.
    pub cleared_processed: u64,
    /// New unprocessed entries inserted.
    pub added_to_queue: u64,
    /// Existing unprocessed entries whose priority changed.
    pub updated_priorities: u64,
}

/// Maintains the priority queue over the eligible set.
pub struct QueueManager {
    store: Arc<dyn Store>,
}

impl QueueManager {
    /// Build a QueueManager over the given store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Re-derive priority/reason for every eligible repo and reconcile the
    /// queue against it.
    pub async fn refresh_queue(&self, now: DateTime<Utc>) -> Result<QueueRefreshStats> {
        let mut stats = QueueRefreshStats::default();

        let cutoff = now - chrono::Duration::days(PROCESSED_RETENTION_DAYS);
        stats.cleared_processed = self
            .store
            .delete_processed_queue_entries_before(cutoff)
            .await?;

        for repo in self.store.list_eligible_repos().await? {
            let snapshots = self.store.latest_discovery_snapshots(repo.id, 2).await?;
            let latest_deep = self.store.latest_deep_snapshot(repo.id).await?;
            let reason = classify_priority(&repo, &snapshots, latest_deep.as_ref(), now);
            let priority = reason.priority();

            match self
                .store
                .upsert_queue_entry(repo.id, priority, reason, now)
                .await?
            {
                QueueEntryUpsertResult::Inserted => stats.added_to_queue += 1,
                QueueEntryUpsertResult::PriorityUpdated => stats.updated_priorities += 1,
                QueueEntryUpsertResult::Unchanged => {}
            }
        }

        Ok(stats)
    }

    /// Count unprocessed entries, in total and per priority class.
    pub async fn get_queue_summary(&self) -> Result<QueueSummary> {
        self.store.queue_summary().await
    }
}

/// Evaluate the priority classes top-to-bottom; first match wins.
///
/// `snapshots` must be the repo's most recent discovery snapshots, newest
/// first (as returned by `Store::latest_discovery_snapshots(repo_id, 2)`).
pub fn classify_priority(
    repo: &Repo,
    snapshots: &[DiscoverySnapshot],
    latest_deep: Option<&DeepSnapshot>,
    now: DateTime<Utc>,
) -> PriorityReason {
    if now - repo.first_discovered_at <= chrono::Duration::days(NEWLY_ELIGIBLE_WINDOW_DAYS) {
        return PriorityReason::NewlyEligible;
    }

    if star_velocity(snapshots) > HIGH_MOMENTUM_STARS_PER_DAY {
        return PriorityReason::HighMomentum;
    }

    if now - repo.pushed_at <= chrono::Duration::days(ACTIVITY_SPIKE_WINDOW_DAYS) {
        return PriorityReason::ActivitySpike;
    }

    let is_stale = match latest_deep {
        None => true,
        Some(snapshot) => {
            now - snapshot.snapshot_date > chrono::Duration::days(STALE_DEEP_SNAPSHOT_DAYS)
        }
    };
    if is_stale {
        return PriorityReason::Stale;
    }

    PriorityReason::Regular
}

/// `(recent.stars - older.stars) / delta_days`, between the two most recent
/// discovery snapshots. `0.0` if fewer than two exist or `delta_days <= 0`.
fn star_velocity(snapshots: &[DiscoverySnapshot]) -> f64 {
    let (Some(recent), Some(older)) = (snapshots.first(), snapshots.get(1)) else {
        return 0.0;
    };

    let delta_days = (recent.snapshot_date - older.snapshot_date).num_seconds() as f64 / 86_400.0;
    if delta_days <= 0.0 {
        return 0.0;
    }

    (recent.stars - older.stars) as f64 / delta_days
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_repo(first_discovered_at: DateTime<Utc>, pushed_at: DateTime<Utc>) -> Repo {
        Repo {
            id: Uuid::new_v4(),
            github_id: 1,
            owner: "octocat".to_string(),
            name: "hello-world".to_string(),
            full_name: "octocat/hello-world".to_string(),
            language: None,
            stars: 2000,
            forks: 10,
            created_at: first_discovered_at,
            pushed_at,
            archived: false,
            is_fork: false,
            first_discovered_at,
            last_seen_at: pushed_at,
            eligible: true,
        }
    }

    #[test]
    fn test_priority_newly_eligible_beats_activity_spike() {
        let now = Utc::now();
        let repo = sample_repo(now - chrono::Duration::days(10), now - chrono::Duration::days(1));
        assert_eq!(
            classify_priority(&repo, &[], None, now),
            PriorityReason::NewlyEligible
        );
    }

    #[test]
    fn test_priority_falls_to_activity_spike_after_newly_eligible_window() {
        let now = Utc::now();
        let repo = sample_repo(now - chrono::Duration::days(20), now - chrono::Duration::days(1));
        assert_eq!(
            classify_priority(&repo, &[], None, now),
            PriorityReason::ActivitySpike
        );
    }

    #[test]
    fn test_priority_high_momentum_from_velocity() {
        let now = Utc::now();
        let repo = sample_repo(
            now - chrono::Duration::days(60),
            now - chrono::Duration::days(30),
        );
        let older = DiscoverySnapshot {
            id: Uuid::new_v4(),
            repo_id: repo.id,
            snapshot_date: now - chrono::Duration::days(7),
            stars: 2000,
            forks: 10,
            pushed_at: repo.pushed_at,
            eligible: true,
            raw: serde_json::Value::Null,
        };
        let recent = DiscoverySnapshot {
            snapshot_date: now,
            stars: 2100,
            ..older.clone()
        };
        let velocity = star_velocity(&[recent.clone(), older.clone()]);
        assert!((velocity - 14.285714285714286).abs() < 1e-6);
        assert_eq!(
            classify_priority(&repo, &[recent, older], None, now),
            PriorityReason::HighMomentum
        );
    }
}
