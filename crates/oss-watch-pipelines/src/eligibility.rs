//! The universe membership predicate, shared by Discovery (evaluated against
//! a freshly-fetched upstream payload) and WatchlistGenerator (evaluated
//! against a stored `Repo`).

use chrono::{DateTime, Utc};
use oss_watch_core::Config;

/// The subset of repo attributes the eligibility predicate needs. Kept
/// separate from `Repo` so Discovery can evaluate it before a `Repo` row
/// exists.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityInput {
    /// Current star count.
    pub stars: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-push timestamp.
    pub pushed_at: DateTime<Utc>,
    /// Archived flag.
    pub archived: bool,
    /// Fork flag.
    pub is_fork: bool,
}

/// Evaluate the five-clause eligibility predicate.
pub fn is_eligible(input: EligibilityInput, config: &Config, now: DateTime<Utc>) -> bool {
    let max_age = chrono::Duration::days(config.max_age_days());
    let max_staleness = chrono::Duration::days(config.max_days_since_push);

    input.stars >= i64::from(config.min_stars)
        && input.created_at >= now - max_age
        && !input.archived
        && !input.is_fork
        && input.pushed_at >= now - max_staleness
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base(now: DateTime<Utc>) -> EligibilityInput {
        EligibilityInput {
            stars: 2000,
            created_at: now - chrono::Duration::days(24 * 30),
            pushed_at: now - chrono::Duration::days(90),
            archived: false,
            is_fork: false,
        }
    }

    #[test]
    fn test_eligibility_edge_is_eligible() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let config = Config::default();
        assert!(is_eligible(base(now), &config, now));
    }

    #[test]
    fn test_eligibility_edge_just_under_min_stars() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let config = Config::default();
        let mut input = base(now);
        input.stars = 1999;
        assert!(!is_eligible(input, &config, now));
    }

    #[test]
    fn test_eligibility_edge_archived() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let config = Config::default();
        let mut input = base(now);
        input.archived = true;
        assert!(!is_eligible(input, &config, now));
    }
}
