//! Environment-driven configuration.
//!
//! Mirrors the teacher's `ServerConfig`/env-var loading pattern: typed
//! defaults, a single `from_env` constructor, and a redacting `Debug` impl so
//! secrets never land in logs.

use std::env;
use std::fmt;

/// Universe, budget, and client configuration for OSS Watch.
#[derive(Clone)]
pub struct Config {
    /// Bearer token used to authenticate against the upstream API.
    pub github_token: String,
    /// Minimum core-class quota left intact before a call aborts.
    pub api_rate_limit_safety_threshold: u32,
    /// Hard ceiling on upstream requests per DeepAnalysis run.
    pub deep_analysis_max_requests_per_run: u32,
    /// Minimum star count for universe membership.
    pub min_stars: u32,
    /// Maximum repo age, in months, for universe membership.
    pub max_age_months: u32,
    /// Maximum days since last push for universe membership.
    pub max_days_since_push: u32,
    /// Composite health-index weight: velocity.
    pub health_index_weight_velocity: f64,
    /// Composite health-index weight: responsiveness.
    pub health_index_weight_responsiveness: f64,
    /// Composite health-index weight: contributors.
    pub health_index_weight_contributors: f64,
    /// Composite health-index weight: adoption.
    pub health_index_weight_adoption: f64,
    /// Postgres DSN; `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Address the HTTP server binds to.
    pub server_bind_addr: String,
    /// `pretty` or `json`, forwarded to the tracing subscriber.
    pub log_format: String,
    /// Maximum accepted request body size, in bytes.
    pub max_body_size: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("github_token", &"[redacted]")
            .field(
                "api_rate_limit_safety_threshold",
                &self.api_rate_limit_safety_threshold,
            )
            .field(
                "deep_analysis_max_requests_per_run",
                &self.deep_analysis_max_requests_per_run,
            )
            .field("min_stars", &self.min_stars)
            .field("max_age_months", &self.max_age_months)
            .field("max_days_since_push", &self.max_days_since_push)
            .field("database_url", &self.database_url.as_ref().map(|_| "[redacted]"))
            .field("server_bind_addr", &self.server_bind_addr)
            .field("log_format", &self.log_format)
            .field("max_body_size", &self.max_body_size)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: String::new(),
            api_rate_limit_safety_threshold: 500,
            deep_analysis_max_requests_per_run: 5000,
            min_stars: 2000,
            max_age_months: 24,
            max_days_since_push: 90,
            health_index_weight_velocity: 0.25,
            health_index_weight_responsiveness: 0.25,
            health_index_weight_contributors: 0.25,
            health_index_weight_adoption: 0.25,
            database_url: None,
            server_bind_addr: "0.0.0.0:8080".to_string(),
            log_format: "pretty".to_string(),
            max_body_size: 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            github_token: env::var("OSS_WATCH_GITHUB_TOKEN").unwrap_or(defaults.github_token),
            api_rate_limit_safety_threshold: env_parsed(
                "OSS_WATCH_API_SAFETY_FLOOR",
                defaults.api_rate_limit_safety_threshold,
            ),
            deep_analysis_max_requests_per_run: env_parsed(
                "OSS_WATCH_DEEP_ANALYSIS_MAX_REQUESTS_PER_RUN",
                defaults.deep_analysis_max_requests_per_run,
            ),
            min_stars: env_parsed("OSS_WATCH_MIN_STARS", defaults.min_stars),
            max_age_months: env_parsed("OSS_WATCH_MAX_AGE_MONTHS", defaults.max_age_months),
            max_days_since_push: env_parsed(
                "OSS_WATCH_MAX_DAYS_SINCE_PUSH",
                defaults.max_days_since_push,
            ),
            health_index_weight_velocity: env_parsed(
                "OSS_WATCH_HEALTH_INDEX_WEIGHT_VELOCITY",
                defaults.health_index_weight_velocity,
            ),
            health_index_weight_responsiveness: env_parsed(
                "OSS_WATCH_HEALTH_INDEX_WEIGHT_RESPONSIVENESS",
                defaults.health_index_weight_responsiveness,
            ),
            health_index_weight_contributors: env_parsed(
                "OSS_WATCH_HEALTH_INDEX_WEIGHT_CONTRIBUTORS",
                defaults.health_index_weight_contributors,
            ),
            health_index_weight_adoption: env_parsed(
                "OSS_WATCH_HEALTH_INDEX_WEIGHT_ADOPTION",
                defaults.health_index_weight_adoption,
            ),
            database_url: env::var("OSS_WATCH_DATABASE_URL").ok(),
            server_bind_addr: env::var("OSS_WATCH_SERVER_BIND_ADDR")
                .unwrap_or(defaults.server_bind_addr),
            log_format: env::var("OSS_WATCH_LOG_FORMAT").unwrap_or(defaults.log_format),
            max_body_size: env_parsed("OSS_WATCH_MAX_BODY_SIZE", defaults.max_body_size),
        }
    }

    /// Days corresponding to `max_age_months`, per the "30 * months" rule.
    pub fn max_age_days(&self) -> i64 {
        30 * self.max_age_months as i64
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.min_stars, 2000);
        assert_eq!(cfg.max_age_months, 24);
        assert_eq!(cfg.max_days_since_push, 90);
        assert_eq!(cfg.api_rate_limit_safety_threshold, 500);
        assert_eq!(cfg.max_age_days(), 720);
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut cfg = Config::default();
        cfg.github_token = "ghp_supersecret".to_string();
        let debug_str = format!("{cfg:?}");
        assert!(!debug_str.contains("supersecret"));
        assert!(debug_str.contains("[redacted]"));
    }
}
