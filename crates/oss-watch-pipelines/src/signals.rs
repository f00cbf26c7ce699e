//! Per-signal computation used by DeepAnalysis. Split out from
//! `deep_analysis.rs` so each signal group's fetch-and-derive logic reads as
//! one function, the way the teacher keeps one concern per module.

use chrono::{DateTime, Utc};
use oss_watch_client::RateClient;
use oss_watch_core::model::{
    Adoption, Availability, CommunityRisk, ContributionDistribution, ContributorHealth,
    Responsiveness, Velocity,
};
use oss_watch_core::{Error, Result};
use tokio_util::sync::CancellationToken;

use crate::linreg::slope;
use crate::upstream::{
    CommitActivityWeek, ContributorStat, SearchCountResponse, UpstreamComment, UpstreamIssue,
    UpstreamRepo, MAINTAINER_ASSOCIATIONS,
};

const COMMIT_ACTIVITY_WEEKS: usize = 26;
const MONTHLY_WINDOW_WEEKS: usize = 4;
const VELOCITY_WEEKS: usize = 12;
const MAX_RESPONSIVENESS_ITEMS: u32 = 30;

/// Checked before every upstream sub-fetch so a cancellation fired mid-repo
/// is observed immediately rather than at the next repo boundary.
fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// Fetch commit activity and all-time contributor stats, and derive
/// contributor health + the community-risk fields that reuse the same
/// distribution.
pub async fn contributor_health(
    client: &RateClient,
    owner: &str,
    name: &str,
    cancel: &CancellationToken,
) -> Result<(ContributorHealth, Option<Vec<CommitActivityWeek>>)> {
    check_cancelled(cancel)?;
    let commit_activity = client
        .get::<Vec<CommitActivityWeek>>(
            &format!("repos/{owner}/{name}/stats/commit_activity"),
            &[],
        )
        .await?;
    check_cancelled(cancel)?;
    let contributors = client
        .get::<Vec<ContributorStat>>(&format!("repos/{owner}/{name}/stats/contributors"), &[])
        .await?;

    let (commit_activity, contributors) = match (commit_activity, contributors) {
        (Some(c), Some(s)) if !c.is_empty() && !s.is_empty() => (c, s),
        _ => {
            return Ok((
                ContributorHealth {
                    monthly_active_contributors_6m: None,
                    distribution: None,
                    availability: Availability::InsufficientData,
                },
                None,
            ))
        }
    };

    let monthly = monthly_active_contributors(&commit_activity);
    let distribution = contribution_distribution(&contributors);

    Ok((
        ContributorHealth {
            monthly_active_contributors_6m: Some(monthly),
            distribution: Some(distribution),
            availability: Availability::Available,
        },
        Some(commit_activity),
    ))
}

fn monthly_active_contributors(commit_activity: &[CommitActivityWeek]) -> [i64; 6] {
    let recent: Vec<i64> = commit_activity
        .iter()
        .rev()
        .take(COMMIT_ACTIVITY_WEEKS)
        .map(|w| w.total)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let mut months = [0i64; 6];
    for (month_idx, chunk) in recent.chunks(MONTHLY_WINDOW_WEEKS).take(6).enumerate() {
        months[month_idx] = chunk.iter().sum();
    }
    months
}

fn contribution_distribution(contributors: &[ContributorStat]) -> ContributionDistribution {
    let mut totals: Vec<i64> = contributors.iter().map(|c| c.total).collect();
    totals.sort_unstable_by(|a, b| b.cmp(a));

    let total_commits: i64 = totals.iter().sum();
    let top_1 = totals.first().copied().unwrap_or(0);
    let top_5: i64 = totals.iter().take(5).sum();

    let denom = total_commits.max(1) as f64;
    ContributionDistribution {
        total_contributors: contributors.len() as u32,
        top_contributor_commits: top_1,
        top_1_share: top_1 as f64 / denom,
        top_5_share: top_5 as f64 / denom,
    }
}

/// Velocity series + trend slopes. `commit_activity` is the same payload
/// already fetched for contributor health, to avoid a second request.
pub async fn velocity(
    client: &RateClient,
    owner: &str,
    name: &str,
    commit_activity: Option<&[CommitActivityWeek]>,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> Result<Velocity> {
    let weekly_commits_12w = commit_activity.map(|weeks| {
        weeks
            .iter()
            .rev()
            .take(VELOCITY_WEEKS)
            .map(|w| w.total)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<Vec<_>>()
    });

    let mut weekly_prs = Vec::with_capacity(VELOCITY_WEEKS);
    let mut weekly_issues = Vec::with_capacity(VELOCITY_WEEKS);

    for week_idx in 0..VELOCITY_WEEKS {
        let weeks_ago_end = VELOCITY_WEEKS - week_idx;
        let start = now - chrono::Duration::days(7 * weeks_ago_end as i64);
        let end = start + chrono::Duration::days(7);

        check_cancelled(cancel)?;
        let query = format!(
            "repo:{owner}/{name} is:pr created:{}..{}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );
        let pr_count = client
            .get::<SearchCountResponse>("search/issues", &[("q", query), ("per_page", "1".to_string())])
            .await?
            .map(|r| r.total_count as i64)
            .unwrap_or(0);
        weekly_prs.push(pr_count);

        check_cancelled(cancel)?;
        let query = format!(
            "repo:{owner}/{name} is:issue created:{}..{}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );
        let issue_count = client
            .get::<SearchCountResponse>("search/issues", &[("q", query), ("per_page", "1".to_string())])
            .await?
            .map(|r| r.total_count as i64)
            .unwrap_or(0);
        weekly_issues.push(issue_count);
    }

    Ok(Velocity {
        commit_trend_slope: weekly_commits_12w.as_deref().map(slope),
        weekly_commits_12w,
        pr_trend_slope: Some(slope(&weekly_prs)),
        weekly_prs_12w: Some(weekly_prs),
        issue_trend_slope: Some(slope(&weekly_issues)),
        weekly_issues_12w: Some(weekly_issues),
    })
}

/// Responsiveness: median time-to-first-maintainer-response, for issues and
/// for PRs separately.
pub async fn responsiveness(
    client: &RateClient,
    owner: &str,
    name: &str,
    cancel: &CancellationToken,
) -> Result<Responsiveness> {
    check_cancelled(cancel)?;
    let issues = client
        .get::<Vec<UpstreamIssue>>(
            &format!("repos/{owner}/{name}/issues"),
            &[
                ("state", "closed".to_string()),
                ("sort", "updated".to_string()),
                ("direction", "desc".to_string()),
                ("per_page", MAX_RESPONSIVENESS_ITEMS.to_string()),
            ],
        )
        .await?;

    let Some(issues) = issues else {
        return Ok(Responsiveness {
            median_issue_response_time_hours: None,
            median_pr_response_time_hours: None,
            availability: Availability::InsufficientData,
        });
    };

    if issues.is_empty() {
        return Ok(Responsiveness {
            median_issue_response_time_hours: None,
            median_pr_response_time_hours: None,
            availability: Availability::InsufficientData,
        });
    }

    let mut issue_hours = Vec::new();
    let mut pr_hours = Vec::new();

    for item in &issues {
        check_cancelled(cancel)?;
        let comments = client
            .get::<Vec<UpstreamComment>>(
                &format!("repos/{owner}/{name}/issues/{}/comments", item.number),
                &[],
            )
            .await?
            .unwrap_or_default();

        let Some(first_response) = comments
            .iter()
            .find(|c| MAINTAINER_ASSOCIATIONS.contains(&c.author_association.as_str()))
        else {
            continue;
        };

        let hours = (first_response.created_at - item.created_at).num_seconds() as f64 / 3600.0;
        if item.pull_request.is_some() {
            pr_hours.push(hours);
        } else {
            issue_hours.push(hours);
        }
    }

    let availability = if issue_hours.is_empty() && pr_hours.is_empty() {
        Availability::Partial
    } else {
        Availability::Available
    };

    Ok(Responsiveness {
        median_issue_response_time_hours: median(&mut issue_hours),
        median_pr_response_time_hours: median(&mut pr_hours),
        availability,
    })
}

/// Adoption: fork-to-star ratio from the repo summary; dependents and
/// package downloads are not implemented upstream.
pub async fn adoption(
    client: &RateClient,
    owner: &str,
    name: &str,
    cancel: &CancellationToken,
) -> Result<Adoption> {
    check_cancelled(cancel)?;
    let repo = client
        .get::<UpstreamRepo>(&format!("repos/{owner}/{name}"), &[])
        .await?;

    let Some(repo) = repo else {
        return Ok(Adoption {
            dependents_count: None,
            npm_downloads_30d: None,
            fork_to_star_ratio: None,
            availability: Availability::InsufficientData,
        });
    };

    let ratio = repo.forks_count as f64 / repo.stargazers_count.max(1) as f64;

    Ok(Adoption {
        dependents_count: None,
        npm_downloads_30d: None,
        fork_to_star_ratio: Some(ratio),
        availability: Availability::Partial,
    })
}

/// Community risk reuses the contributor-health distribution; the inequality
/// coefficient is intentionally left unset (see the design notes on why a
/// sampled contributor list can't support it).
pub fn community_risk(contributor_health: &ContributorHealth) -> CommunityRisk {
    match &contributor_health.distribution {
        Some(dist) => CommunityRisk {
            top_contributor_share: Some(dist.top_1_share),
            gini_coefficient: None,
            active_maintainers_count: Some(dist.total_contributors),
        },
        None => CommunityRisk::default(),
    }
}

fn median(values: &mut Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd() {
        let mut v = vec![3.0, 1.0, 2.0];
        assert_eq!(median(&mut v), Some(2.0));
    }

    #[test]
    fn test_median_even() {
        let mut v = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(median(&mut v), Some(2.5));
    }

    #[test]
    fn test_monthly_active_contributors_sums_four_week_windows() {
        let weeks: Vec<CommitActivityWeek> = (0..26)
            .map(|i| CommitActivityWeek {
                week: i,
                total: 1,
            })
            .collect();
        let months = monthly_active_contributors(&weeks);
        assert_eq!(months, [4, 4, 4, 4, 4, 4]);
    }

    #[test]
    fn test_contribution_distribution_shares() {
        let contributors = vec![
            ContributorStat { total: 100, author: None },
            ContributorStat { total: 50, author: None },
            ContributorStat { total: 50, author: None },
        ];
        let dist = contribution_distribution(&contributors);
        assert_eq!(dist.total_contributors, 3);
        assert!((dist.top_1_share - 0.5).abs() < 1e-9);
        assert!((dist.top_5_share - 1.0).abs() < 1e-9);
    }
}
