//! Discovery pipeline: materializes the eligible universe from search
//! results on each run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use oss_watch_client::RateClient;
use oss_watch_core::{Config, DiscoverySnapshot, Error, JobStatus, JobType, Result};
use oss_watch_store::{RepoUpsert, Store};
use serde::Serialize;
use uuid::Uuid;

use crate::eligibility::{is_eligible, EligibilityInput};
use crate::upstream::UpstreamRepo;

const PAGE_SIZE: u32 = 100;
const MAX_PAGES: u32 = 10;

/// Stats returned from a single `Discovery::run` invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryStats {
    /// Repos returned by search, across all pages.
    pub found: u64,
    /// Of those, the count currently eligible.
    pub eligible: u64,
    /// Of those, the count currently ineligible.
    pub ineligible: u64,
    /// Repos seen for the first time this run.
    pub new: u64,
    /// Repos that already existed and were updated.
    pub updated: u64,
    /// Upstream requests issued this run.
    pub requests_made: u64,
    /// Core-class quota remaining at the end of the run, if known.
    pub rate_remaining: Option<u32>,
}

/// Materializes the eligible universe from search results.
pub struct Discovery {
    store: Arc<dyn Store>,
    client: Arc<RateClient>,
    config: Config,
}

impl Discovery {
    /// Build a Discovery pipeline over the given store/client/config.
    pub fn new(store: Arc<dyn Store>, client: Arc<RateClient>, config: Config) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    /// Run one discovery pass.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<DiscoveryStats> {
        let job = self.store.start_job_run(JobType::Discovery, now).await?;

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
            Err((stats, err)) => {
                self.store
                    .finish_job_run(
                        job.id,
                        Utc::now(),
                        JobStatus::Failed,
                        serde_json::to_value(&stats)?,
                        Some(err.to_string()),
                    )
                    .await?;
                Err(err)
            }
        }
    }

    async fn run_inner(&self, now: DateTime<Utc>) -> std::result::Result<DiscoveryStats, (DiscoveryStats, Error)> {
        let mut stats = DiscoveryStats::default();
        let query = self.build_query(now);

        for page in 1..=MAX_PAGES {
            let params = [
                ("q", query.clone()),
                ("sort", "stars".to_string()),
                ("order", "desc".to_string()),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];

            let response = self
                .client
                .get::<serde_json::Value>("search/repositories", &params)
                .await;
            stats.requests_made += 1;

            let value = match response {
                Ok(Some(v)) => v,
                Ok(None) => break,
                Err(err) => {
                    let remaining = self.client.stats().await.core_remaining;
                    stats.rate_remaining = remaining;
                    return Err((stats, err));
                }
            };

            let items = value
                .get("items")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();

            if items.is_empty() {
                break;
            }

            let page_len = items.len();

            for raw in items {
                match self.ingest_repo(raw, now, &mut stats).await {
                    Ok(()) => {}
                    Err(err) => return Err((stats, err)),
                }
            }

            if page_len < PAGE_SIZE as usize {
                break;
            }
        }

        stats.rate_remaining = self.client.stats().await.core_remaining;
        Ok(stats)
    }

    async fn ingest_repo(
        &self,
        raw: serde_json::Value,
        now: DateTime<Utc>,
        stats: &mut DiscoveryStats,
    ) -> Result<()> {
        let upstream: UpstreamRepo = serde_json::from_value(raw.clone())?;
        stats.found += 1;

        let eligible = is_eligible(
            EligibilityInput {
                stars: upstream.stargazers_count,
                created_at: upstream.created_at,
                pushed_at: upstream.pushed_at,
                archived: upstream.archived,
                is_fork: upstream.fork,
            },
            &self.config,
            now,
        );

        if eligible {
            stats.eligible += 1;
        } else {
            stats.ineligible += 1;
        }

        let existed = self
            .store
            .get_repo_by_github_id(upstream.id)
            .await?
            .is_some();

        let repo = self
            .store
            .upsert_repo(
                RepoUpsert {
                    github_id: upstream.id,
                    owner: upstream.owner.login,
                    name: upstream.name,
                    language: upstream.language,
                    stars: upstream.stargazers_count,
                    forks: upstream.forks_count,
                    created_at: upstream.created_at,
                    pushed_at: upstream.pushed_at,
                    archived: upstream.archived,
                    is_fork: upstream.fork,
                    eligible,
                },
                now,
            )
            .await?;

        if existed {
            stats.updated += 1;
        } else {
            stats.new += 1;
        }

        self.store
            .append_discovery_snapshot(DiscoverySnapshot {
                id: Uuid::new_v4(),
                repo_id: repo.id,
                snapshot_date: now,
                stars: repo.stars,
                forks: repo.forks,
                pushed_at: repo.pushed_at,
                eligible,
                raw,
            })
            .await?;

        Ok(())
    }

    fn build_query(&self, now: DateTime<Utc>) -> String {
        let cutoff = now - chrono::Duration::days(self.config.max_age_days());
        format!(
            "stars:>={} created:>={} archived:false fork:false",
            self.config.min_stars,
            cutoff.format("%Y-%m-%d")
        )
    }
}
