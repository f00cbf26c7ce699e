//! Secondary-rate-limit retry policy.
//!
//! The upstream API distinguishes a hard primary limit (zero remaining,
//! nothing to do but fail) from a soft secondary limit (briefly too many
//! requests; back off and retry). This mirrors the retry-policy shape the
//! teacher's client config carries, specialized to the `Retry-After`-driven
//! backoff this API actually returns.

use std::time::Duration;

/// Governs how many times, and how long, to wait on a secondary rate limit.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts before giving up.
    pub max_retries: u32,
    /// Upper bound on any single backoff sleep.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_backoff: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Build a policy with a custom retry count, default backoff cap.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// `min(retry_after * 2^attempt, max_backoff)`, the formula the upstream
    /// service's secondary-limit guidance uses.
    pub fn backoff_for(&self, retry_after: Duration, attempt: u32) -> Duration {
        let scaled = retry_after
            .checked_mul(2u32.saturating_pow(attempt))
            .unwrap_or(self.max_backoff);
        scaled.min(self.max_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_exponentially_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff_for(Duration::from_secs(2), 0),
            Duration::from_secs(2)
        );
        assert_eq!(
            policy.backoff_for(Duration::from_secs(2), 1),
            Duration::from_secs(4)
        );
        assert_eq!(
            policy.backoff_for(Duration::from_secs(2), 2),
            Duration::from_secs(8)
        );
        // 60 * 2^3 = 480, capped at 300.
        assert_eq!(
            policy.backoff_for(Duration::from_secs(60), 3),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_default_max_retries() {
        assert_eq!(RetryPolicy::default().max_retries, 3);
    }
}
