//! DeepAnalysis pipeline: drains the priority queue under an API budget,
//! computing per-repo signal bundles.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use oss_watch_client::RateClient;
use oss_watch_core::{Config, DeepSnapshot, Error, JobStatus, JobType, Result};
use oss_watch_store::Store;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::signals;

/// Why a `DeepAnalysis::run` stopped before draining the whole queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The queue was fully drained.
    QueueEmpty,
    /// `max_repos` repos were processed.
    MaxReposReached,
    /// `deep_analysis_max_requests_per_run` was reached.
    RequestBudgetExhausted,
    /// The caller's cancellation token fired.
    Cancelled,
}

/// Stats returned from a single `DeepAnalysis::run` invocation.
#[derive(Debug, Clone, Serialize)]
pub struct DeepAnalysisStats {
    /// Repos successfully analyzed and marked processed.
    pub repos_processed: u64,
    /// Repos that hit a non-fatal error; `full_name -> reason`.
    pub repos_skipped: HashMap<String, String>,
    /// Upstream requests issued this run.
    pub requests_made: u64,
    /// Why the run stopped.
    pub stop_reason: StopReason,
}

/// Drains the priority queue and produces `DeepSnapshot`s, one repo at a
/// time, in `(priority desc, queued_at asc)` order.
pub struct DeepAnalysis {
    store: Arc<dyn Store>,
    client: Arc<RateClient>,
    config: Config,
}

impl DeepAnalysis {
    /// Build a DeepAnalysis pipeline over the given store/client/config.
    pub fn new(store: Arc<dyn Store>, client: Arc<RateClient>, config: Config) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    /// Run one deep-analysis pass, stopping at `max_repos` processed repos,
    /// at the configured request budget, on cancellation, or on
    /// `RateLimitExceeded`.
    pub async fn run(
        &self,
        max_repos: u32,
        now: DateTime<Utc>,
        cancel: CancellationToken,
    ) -> Result<DeepAnalysisStats> {
        if !(1..=100).contains(&max_repos) {
            return Err(Error::ValidationError(
                "max_repos must be in [1, 100]".to_string(),
            ));
        }

        let job = self.store.start_job_run(JobType::DeepAnalysis, now).await?;
        let requests_at_start = self.client.stats().await.total_requests;

        match self.run_inner(max_repos, now, &cancel, requests_at_start).await {
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
            Err((stats, err)) => {
                let stats_value = stats
                    .as_ref()
                    .map(serde_json::to_value)
                    .transpose()?
                    .unwrap_or(serde_json::Value::Null);
                self.store
                    .finish_job_run(job.id, Utc::now(), JobStatus::Failed, stats_value, Some(err.to_string()))
                    .await?;
                Err(err)
            }
        }
    }

    async fn run_inner(
        &self,
        max_repos: u32,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
        requests_at_start: u64,
    ) -> std::result::Result<DeepAnalysisStats, (Option<DeepAnalysisStats>, Error)> {
        let mut stats = DeepAnalysisStats {
            repos_processed: 0,
            repos_skipped: HashMap::new(),
            requests_made: 0,
            stop_reason: StopReason::QueueEmpty,
        };

        let entries = self
            .store
            .unprocessed_queue_entries(max_repos as usize * 10)
            .await
            .map_err(|e| (None, e))?;

        for entry in entries {
            if cancel.is_cancelled() {
                stats.stop_reason = StopReason::Cancelled;
                return Err((Some(stats), Error::Cancelled));
            }

            if stats.repos_processed >= max_repos as u64 {
                stats.stop_reason = StopReason::MaxReposReached;
                break;
            }

            let used = self.client.stats().await.total_requests - requests_at_start;
            if used >= u64::from(self.config.deep_analysis_max_requests_per_run) {
                stats.stop_reason = StopReason::RequestBudgetExhausted;
                break;
            }

            let Some(repo) = self.store.get_repo(entry.repo_id).await.map_err(|e| (Some(stats.clone()), e))? else {
                continue;
            };

            match self.analyze_repo(&repo, now, cancel).await {
                Ok(snapshot) => {
                    self.store
                        .append_deep_snapshot(snapshot)
                        .await
                        .map_err(|e| (Some(stats.clone()), e))?;
                    self.store
                        .update_queue_entry(
                            entry.id,
                            oss_watch_store::QueueEntryUpdate {
                                priority: entry.priority,
                                priority_reason: entry.priority_reason,
                                processed: true,
                                processed_at: Some(now),
                                last_deep_analysis_at: Some(now),
                            },
                        )
                        .await
                        .map_err(|e| (Some(stats.clone()), e))?;
                    stats.repos_processed += 1;
                }
                Err(Error::RateLimitExceeded { retry_after_secs }) => {
                    stats.stop_reason = StopReason::RequestBudgetExhausted;
                    return Err((
                        Some(stats),
                        Error::RateLimitExceeded { retry_after_secs },
                    ));
                }
                Err(Error::Cancelled) => {
                    stats.stop_reason = StopReason::Cancelled;
                    return Err((Some(stats), Error::Cancelled));
                }
                Err(err) => {
                    stats.repos_skipped.insert(repo.full_name.clone(), err.to_string());
                }
            }
        }

        stats.requests_made = self.client.stats().await.total_requests - requests_at_start;
        Ok(stats)
    }

    async fn analyze_repo(
        &self,
        repo: &oss_watch_core::Repo,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<DeepSnapshot> {
        let (contributor_health, commit_activity) =
            signals::contributor_health(&self.client, &repo.owner, &repo.name, cancel).await?;
        let velocity = signals::velocity(
            &self.client,
            &repo.owner,
            &repo.name,
            commit_activity.as_deref(),
            now,
            cancel,
        )
        .await?;
        let responsiveness =
            signals::responsiveness(&self.client, &repo.owner, &repo.name, cancel).await?;
        let adoption = signals::adoption(&self.client, &repo.owner, &repo.name, cancel).await?;
        let community_risk = signals::community_risk(&contributor_health);

        let health_index = compute_health_index(&velocity, &responsiveness, &contributor_health, &adoption, &self.config);

        let metrics = serde_json::json!({
            "contributor_health": contributor_health,
            "velocity": velocity,
            "responsiveness": responsiveness,
            "adoption": adoption,
            "community_risk": community_risk,
        });

        Ok(DeepSnapshot {
            id: Uuid::new_v4(),
            repo_id: repo.id,
            snapshot_date: now,
            contributor_health,
            velocity,
            responsiveness,
            adoption,
            community_risk,
            health_index,
            metrics,
        })
    }
}

fn compute_health_index(
    velocity: &oss_watch_core::model::Velocity,
    responsiveness: &oss_watch_core::model::Responsiveness,
    contributor_health: &oss_watch_core::model::ContributorHealth,
    adoption: &oss_watch_core::model::Adoption,
    config: &Config,
) -> Option<f64> {
    let velocity_component = velocity.commit_trend_slope.map(|s| s.max(0.0).min(1.0));
    let responsiveness_component = responsiveness
        .median_issue_response_time_hours
        .map(|h| (1.0 - h / 168.0).clamp(0.0, 1.0));
    let contributors_component = contributor_health
        .distribution
        .as_ref()
        .map(|d| (1.0 - d.top_1_share).clamp(0.0, 1.0));
    let adoption_component = adoption.fork_to_star_ratio.map(|r| r.min(1.0));

    let components = [
        (velocity_component, config.health_index_weight_velocity),
        (responsiveness_component, config.health_index_weight_responsiveness),
        (contributors_component, config.health_index_weight_contributors),
        (adoption_component, config.health_index_weight_adoption),
    ];

    let available: Vec<(f64, f64)> = components
        .into_iter()
        .filter_map(|(v, w)| v.map(|v| (v, w)))
        .collect();

    if available.is_empty() {
        return None;
    }

    let weight_sum: f64 = available.iter().map(|(_, w)| w).sum();
    if weight_sum == 0.0 {
        return None;
    }

    Some(available.iter().map(|(v, w)| v * w).sum::<f64>() / weight_sum * 100.0)
}
