//! WatchlistGenerator: joins the latest snapshots into three independent
//! scores per eligible candidate and emits a ranked, rationale-bearing set.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use oss_watch_core::{DeepSnapshot, JobStatus, JobType, Repo, Result, WatchlistEntry};
use oss_watch_store::Store;
use serde::Serialize;
use uuid::Uuid;

const CANDIDATE_AGE_MONTHS: i64 = 24;
const CROSSED_2K_WINDOW_DAYS: i64 = 30;
const CROSSED_2K_THRESHOLD: i64 = 2000;
const EXCEPTIONAL_COMMIT_TREND_SLOPE: f64 = 5.0;
const EXCEPTIONAL_ACTIVE_MAINTAINERS: u32 = 20;
const EXCEPTIONAL_MEDIAN_ISSUE_HOURS: f64 = 6.0;
const YOUNG_REPO_DAYS: i64 = 60;

/// Stats returned from `WatchlistGenerator::run`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WatchlistStats {
    /// Candidates considered (created within the window, currently eligible).
    pub candidates_considered: u64,
    /// Candidates admitted after the per-candidate eligibility refinement.
    pub admitted: u64,
}

/// Scores each eligible candidate along three independent tracks and emits a
/// ranked set of `WatchlistEntry` rows.
pub struct WatchlistGenerator {
    store: Arc<dyn Store>,
}

impl WatchlistGenerator {
    /// Build a WatchlistGenerator over the given store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Run one watchlist generation pass for `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<WatchlistStats> {
        let job = self.store.start_job_run(JobType::Watchlist, now).await?;

        match self.run_inner(now).await {
            Ok(stats) => {
                self.store
                    .finish_job_run(
                        job.id,
                        Utc::now(),
                        JobStatus::Completed,
                        serde_json::to_value(&stats)?,
                        None,
                    )
                    .await?;
                Ok(stats)
            }
            Err(err) => {
                self.store
                    .finish_job_run(job.id, Utc::now(), JobStatus::Failed, serde_json::Value::Null, Some(err.to_string()))
                    .await?;
                Err(err)
            }
        }
    }

    async fn run_inner(&self, now: DateTime<Utc>) -> Result<WatchlistStats> {
        let mut stats = WatchlistStats::default();
        let cutoff = now - chrono::Duration::days(30 * CANDIDATE_AGE_MONTHS);

        for repo in self.store.list_repos_created_after(cutoff).await? {
            if !repo.eligible {
                continue;
            }
            stats.candidates_considered += 1;

            let crossed_2k = self
                .store
                .first_discovery_snapshot_at_or_above(repo.id, CROSSED_2K_THRESHOLD)
                .await?
                .map(|s| now - s.snapshot_date <= chrono::Duration::days(CROSSED_2K_WINDOW_DAYS))
                .unwrap_or(false);

            let latest_deep = self.store.latest_deep_snapshot(repo.id).await?;
            let exceptional = latest_deep.as_ref().is_some_and(is_exceptional);

            if !crossed_2k && !exceptional {
                continue;
            }

            let earliest_2k = self
                .store
                .first_discovery_snapshot_at_or_above(repo.id, CROSSED_2K_THRESHOLD)
                .await?;
            let velocity = self
                .store
                .latest_discovery_snapshots(repo.id, 2)
                .await
                .map(|snapshots| star_velocity(&snapshots))?;

            let entry = build_entry(&repo, latest_deep.as_ref(), earliest_2k.as_ref(), velocity, now);
            self.store.append_watchlist_entry(entry).await?;
            stats.admitted += 1;
        }

        Ok(stats)
    }
}

fn is_exceptional(deep: &DeepSnapshot) -> bool {
    deep.commit_trend_slope().is_some_and(|s| s > EXCEPTIONAL_COMMIT_TREND_SLOPE)
        || deep
            .active_maintainers_count()
            .is_some_and(|c| c > EXCEPTIONAL_ACTIVE_MAINTAINERS)
        || deep
            .median_issue_response_hours()
            .is_some_and(|h| h < EXCEPTIONAL_MEDIAN_ISSUE_HOURS)
}

fn star_velocity(snapshots: &[oss_watch_core::DiscoverySnapshot]) -> f64 {
    let (Some(recent), Some(older)) = (snapshots.first(), snapshots.get(1)) else {
        return 0.0;
    };
    let delta_days = (recent.snapshot_date - older.snapshot_date).num_seconds() as f64 / 86_400.0;
    if delta_days <= 0.0 {
        return 0.0;
    }
    (recent.stars - older.stars) as f64 / delta_days
}

fn days_to_2k(repo: &Repo, earliest_2k: Option<&oss_watch_core::DiscoverySnapshot>, now: DateTime<Utc>) -> Option<f64> {
    if let Some(snapshot) = earliest_2k {
        return Some((snapshot.snapshot_date - repo.created_at).num_seconds() as f64 / 86_400.0);
    }
    if repo.stars >= CROSSED_2K_THRESHOLD {
        return Some((now - repo.created_at).num_seconds() as f64 / 86_400.0);
    }
    None
}

/// `min(velocity * 2, 40) + max(30 - days_to_2k / 12, 5) (capped at 30, 0 if
/// days_to_2k unknown) + min(commit_trend_slope * 10, 30) (only if slope >
/// 0)`, clamped to `[0, 100]`.
fn momentum_score(velocity: f64, days_to_2k: Option<f64>, commit_trend_slope: Option<f64>) -> f64 {
    let star_velocity_term = (velocity * 2.0).min(40.0);

    let time_to_2k_term = days_to_2k
        .map(|d| (30.0 - d / 12.0).max(5.0).min(30.0))
        .unwrap_or(0.0);

    let activity_trend_term = commit_trend_slope
        .filter(|&s| s > 0.0)
        .map(|s| (s * 10.0).min(30.0))
        .unwrap_or(0.0);

    (star_velocity_term + time_to_2k_term + activity_trend_term).clamp(0.0, 100.0)
}

/// `min(count * 0.8, 40) + max(30 - top_share * 30, 0) + max(30 -
/// median_issue_hours / 5.6, 0) (capped at 30)`, clamped to `[0, 100]`.
fn durability_score(
    active_maintainers_count: Option<u32>,
    top_contributor_share: Option<f64>,
    median_issue_response_hours: Option<f64>,
) -> f64 {
    let active_contributors_term = active_maintainers_count
        .map(|c| (f64::from(c) * 0.8).min(40.0))
        .unwrap_or(0.0);

    let bus_factor_term = top_contributor_share
        .map(|s| (30.0 - s * 30.0).max(0.0))
        .unwrap_or(0.0);

    let responsiveness_term = median_issue_response_hours
        .map(|h| (30.0 - h / 5.6).max(0.0).min(30.0))
        .unwrap_or(0.0);

    (active_contributors_term + bus_factor_term + responsiveness_term).clamp(0.0, 100.0)
}

/// `min(log10(deps+1) * 15, 50) + min(log10(dl+1) * 8, 30) + min(ratio * 40,
/// 20)`, clamped to `[0, 100]`.
fn adoption_score(
    dependents_count: Option<i64>,
    npm_downloads_30d: Option<i64>,
    fork_to_star_ratio: Option<f64>,
) -> f64 {
    let dependents_term = dependents_count
        .map(|d| (((d as f64) + 1.0).log10() * 15.0).min(50.0))
        .unwrap_or(0.0);

    let downloads_term = npm_downloads_30d
        .map(|dl| (((dl as f64) + 1.0).log10() * 8.0).min(30.0))
        .unwrap_or(0.0);

    let fork_to_star_term = fork_to_star_ratio
        .map(|r| (r * 40.0).min(20.0))
        .unwrap_or(0.0);

    (dependents_term + downloads_term + fork_to_star_term).clamp(0.0, 100.0)
}

/// Composes the rationale per the fixed factor ordering: age, then momentum,
/// then durability, falling back to a generic "eligible with N stars" line.
fn build_rationale(repo: &Repo, age_days: i64, velocity: f64, active_maintainers_count: Option<u32>) -> String {
    let mut clauses = Vec::new();

    if age_days < YOUNG_REPO_DAYS {
        clauses.push(format!("Only {age_days} days old"));
    }
    if velocity > 0.0 {
        clauses.push(format!("gaining {velocity:.1} stars/day"));
    }
    if active_maintainers_count.is_some_and(|c| c > 0) {
        clauses.push(format!(
            "backed by {} active contributors",
            active_maintainers_count.unwrap_or(0)
        ));
    }

    if clauses.is_empty() {
        format!("Eligible with {} stars.", repo.stars)
    } else {
        format!("{}.", clauses.join(", "))
    }
}

fn build_entry(
    repo: &Repo,
    latest_deep: Option<&DeepSnapshot>,
    earliest_2k: Option<&oss_watch_core::DiscoverySnapshot>,
    velocity: f64,
    now: DateTime<Utc>,
) -> WatchlistEntry {
    let commit_trend_slope = latest_deep.and_then(DeepSnapshot::commit_trend_slope);
    let active_maintainers_count = latest_deep.and_then(DeepSnapshot::active_maintainers_count);
    let top_contributor_share = latest_deep.and_then(DeepSnapshot::top_contributor_share);
    let median_issue_response_hours = latest_deep.and_then(DeepSnapshot::median_issue_response_hours);
    let dependents_count = latest_deep.and_then(|d| d.adoption.dependents_count);
    let npm_downloads_30d = latest_deep.and_then(|d| d.adoption.npm_downloads_30d);
    let fork_to_star_ratio = latest_deep.and_then(|d| d.adoption.fork_to_star_ratio);

    let days_to_2k = days_to_2k(repo, earliest_2k, now);
    let age_days = (now - repo.created_at).num_seconds() / 86_400;

    let momentum_score = momentum_score(velocity, days_to_2k, commit_trend_slope);
    let durability_score = durability_score(active_maintainers_count, top_contributor_share, median_issue_response_hours);
    let adoption_score = adoption_score(dependents_count, npm_downloads_30d, fork_to_star_ratio);

    let rationale = build_rationale(repo, age_days, velocity, active_maintainers_count);

    let metrics_snapshot = serde_json::json!({
        "current_stars": repo.stars,
        "age_days": age_days,
        "star_velocity_per_day": velocity,
        "days_to_2k": days_to_2k,
        "commit_trend_slope": commit_trend_slope,
        "active_maintainers_count": active_maintainers_count,
        "top_contributor_share": top_contributor_share,
        "median_issue_response_hours": median_issue_response_hours,
        "dependents_count": dependents_count,
        "npm_downloads_30d": npm_downloads_30d,
        "fork_to_star_ratio": fork_to_star_ratio,
    });

    WatchlistEntry {
        id: Uuid::new_v4(),
        repo_id: repo.id,
        watchlist_date: now,
        momentum_score,
        durability_score,
        adoption_score,
        rationale,
        metrics_snapshot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_momentum_score_boundary_scenario() {
        let score = momentum_score(5.0, Some(120.0), Some(2.0));
        assert!((score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_durability_score_boundary_scenario() {
        let score = durability_score(Some(10), Some(0.5), Some(28.0));
        assert!((score - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_momentum_score_ignores_negative_slope() {
        let with_negative = momentum_score(5.0, Some(120.0), Some(-3.0));
        let without = momentum_score(5.0, Some(120.0), None);
        assert_eq!(with_negative, without);
    }

    #[test]
    fn test_adoption_score_all_unavailable_is_zero() {
        assert_eq!(adoption_score(None, None, None), 0.0);
    }

    proptest! {
        #[test]
        fn prop_momentum_score_stays_in_range(
            velocity in -1000.0f64..1000.0,
            days_to_2k in proptest::option::of(0.0f64..10_000.0),
            slope in proptest::option::of(-100.0f64..100.0),
        ) {
            let score = momentum_score(velocity, days_to_2k, slope);
            prop_assert!((0.0..=100.0).contains(&score));
        }

        #[test]
        fn prop_durability_score_stays_in_range(
            count in proptest::option::of(0u32..10_000),
            top_share in proptest::option::of(0.0f64..1.0),
            median_hours in proptest::option::of(0.0f64..1000.0),
        ) {
            let score = durability_score(count, top_share, median_hours);
            prop_assert!((0.0..=100.0).contains(&score));
        }

        #[test]
        fn prop_adoption_score_stays_in_range(
            deps in proptest::option::of(0i64..1_000_000),
            downloads in proptest::option::of(0i64..1_000_000_000),
            ratio in proptest::option::of(0.0f64..100.0),
        ) {
            let score = adoption_score(deps, downloads, ratio);
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }
}
