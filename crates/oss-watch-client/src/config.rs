//! RateClient configuration.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection-establishment timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`crate::RateClient`].
#[derive(Clone)]
pub struct RateClientConfig {
    /// Base URL of the upstream API, e.g. `https://api.github.com`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// Bearer token, if the upstream requires authentication.
    pub token: Option<String>,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Minimum core-class remaining quota before a call aborts.
    pub safety_floor: u32,
    /// Retry policy for secondary rate limits.
    pub retry_policy: RetryPolicy,
}

// Custom Debug impl so the bearer token never lands in logs.
impl std::fmt::Debug for RateClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("user_agent", &self.user_agent)
            .field("safety_floor", &self.safety_floor)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

impl Default for RateClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            token: None,
            user_agent: format!("oss-watch/{}", env!("CARGO_PKG_VERSION")),
            safety_floor: 500,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl RateClientConfig {
    /// Build a config pointed at a custom base URL (tests point this at a
    /// `wiremock` server).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            base_url: url.into(),
            ..Default::default()
        }
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the safety floor.
    #[must_use]
    pub fn with_safety_floor(mut self, floor: u32) -> Self {
        self.safety_floor = floor;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateClientConfig::default();
        assert!(config.base_url.starts_with("https://"));
        assert_eq!(config.safety_floor, 500);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = RateClientConfig::default().with_token("secret-token-value");
        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("secret-token-value"));
    }
}
