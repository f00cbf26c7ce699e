//! HTTP client to the upstream code-hosting API.
//!
//! Tracks core/search quotas separately (§4.1, §9 "dual safety limits"),
//! enforces a safety floor on core-class calls, and retries secondary rate
//! limits with capped exponential backoff.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use oss_watch_core::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::RateClientConfig;
use crate::quota::{EndpointClass, Quotas};

/// Snapshot of the client's current quota/usage state, returned by
/// [`RateClient::stats`].
#[derive(Debug, Clone, Copy)]
pub struct RateClientStats {
    /// Total requests issued by this client instance so far.
    pub total_requests: u64,
    /// Remaining core-class quota, if known.
    pub core_remaining: Option<u32>,
    /// Core-class reset time, as a Unix timestamp, if known.
    pub core_reset: Option<u64>,
    /// Remaining search-class quota, if known.
    pub search_remaining: Option<u32>,
    /// Search-class reset time, as a Unix timestamp, if known.
    pub search_reset: Option<u64>,
}

/// Rate-limit-aware HTTP client for the upstream API.
///
/// Safe to share across sequential calls from one pipeline. If ever shared
/// across concurrently-running pipelines, the quota mutex makes the pre-call
/// guard and the post-call update into one critical section, so two callers
/// can't both observe "remaining >= floor" and spend the last permit twice.
pub struct RateClient {
    http: Client,
    config: RateClientConfig,
    quotas: Mutex<Quotas>,
    total_requests: AtomicU64,
}

impl RateClient {
    /// Build a client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(RateClientConfig::default())
    }

    /// Build a client with custom configuration.
    pub fn with_config(config: RateClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;

        Ok(Self {
            http,
            config,
            quotas: Mutex::new(Quotas::default()),
            total_requests: AtomicU64::new(0),
        })
    }

    /// `GET endpoint`, with `params` as query parameters. Returns `Ok(None)`
    /// on a 404, per the design's "404 normalizes to nil" rule.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Option<T>> {
        let class = EndpointClass::classify(endpoint);
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint.trim_start_matches('/'));

        for attempt in 0..=self.config.retry_policy.max_retries {
            // Held across the guard check, the send, and the quota update so
            // two concurrent callers can't both pass the guard and spend the
            // same last permit.
            let mut quotas = self.quotas.lock().await;
            Self::check_guard(class, &quotas, self.config.safety_floor)?;

            let mut request = self.http.get(&url).query(params);
            if let Some(token) = &self.config.token {
                request = request.header("Authorization", format!("token {token}"));
            }

            let response = request.send().await?;
            self.total_requests.fetch_add(1, Ordering::Relaxed);

            let status = response.status();
            let headers = response.headers().clone();
            Self::apply_quota_update(&mut quotas, class, &headers);
            drop(quotas);

            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }

            if status == StatusCode::FORBIDDEN {
                let remaining = parse_header_u32(&headers, "x-ratelimit-remaining");
                if remaining == Some(0) {
                    return Err(Error::RateLimitExceeded {
                        retry_after_secs: parse_header_u64(&headers, "retry-after"),
                    });
                }

                if attempt < self.config.retry_policy.max_retries {
                    let retry_after =
                        Duration::from_secs(parse_header_u64(&headers, "retry-after").unwrap_or(60));
                    let backoff = self.config.retry_policy.backoff_for(retry_after, attempt);
                    tracing::warn!(?backoff, attempt, "secondary rate limit hit, backing off");
                    tokio::time::sleep(backoff).await;
                    continue;
                }

                return Err(Error::RateLimitExceeded {
                    retry_after_secs: None,
                });
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::UpstreamUnavailable(format!("{status}: {body}")));
            }

            return response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| Error::UpstreamUnavailable(e.to_string()));
        }

        Err(Error::RateLimitExceeded {
            retry_after_secs: None,
        })
    }

    /// `POST graphql` with a query/variables body. Always treated as
    /// core-class.
    pub async fn graphql<B: Serialize + ?Sized, T: DeserializeOwned>(&self, body: &B) -> Result<T> {
        let mut quotas = self.quotas.lock().await;
        Self::check_guard(EndpointClass::Core, &quotas, self.config.safety_floor)?;

        let url = format!("{}/graphql", self.config.base_url.trim_end_matches('/'));
        let mut request = self.http.post(&url).json(body);
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("token {token}"));
        }

        let response = request.send().await?;
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        let status = response.status();
        let headers = response.headers().clone();
        Self::apply_quota_update(&mut quotas, EndpointClass::Core, &headers);
        drop(quotas);

        if status == StatusCode::FORBIDDEN {
            return Err(Error::RateLimitExceeded {
                retry_after_secs: parse_header_u64(&headers, "retry-after"),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable(format!("{status}: {body}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::UpstreamUnavailable(e.to_string()))
    }

    /// Current usage/quota snapshot.
    pub async fn stats(&self) -> RateClientStats {
        let quotas = self.quotas.lock().await;
        RateClientStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            core_remaining: quotas.core.remaining,
            core_reset: quotas.core.reset_at.and_then(to_unix),
            search_remaining: quotas.search.remaining,
            search_reset: quotas.search.reset_at.and_then(to_unix),
        }
    }

    /// Release the underlying connection pool. `reqwest::Client` already
    /// drops its pool when the last handle goes away; this exists to mirror
    /// the explicit `close()` the upstream client type exposes so callers
    /// don't have to know the difference.
    pub fn close(&self) {}

    /// Checked with the quota lock already held, so the guard and the
    /// request it gates form one critical section with no gap where another
    /// caller could slip in a second "remaining >= floor" pass.
    fn check_guard(class: EndpointClass, quotas: &Quotas, safety_floor: u32) -> Result<()> {
        if class == EndpointClass::Core {
            if let Some(remaining) = quotas.core.remaining {
                if remaining < safety_floor {
                    return Err(Error::RateLimitExceeded {
                        retry_after_secs: quotas.core.seconds_until_reset(),
                    });
                }
            }
        } else if let Some(remaining) = quotas.search.remaining {
            if remaining == 0 {
                tracing::warn!("search-class quota exhausted; proceeding without a hard floor");
            }
        }
        Ok(())
    }

    /// Applied with the same quota lock still held from [`Self::check_guard`].
    fn apply_quota_update(quotas: &mut Quotas, class: EndpointClass, headers: &reqwest::header::HeaderMap) {
        let remaining = parse_header_u32(headers, "x-ratelimit-remaining");
        let reset = parse_header_u64(headers, "x-ratelimit-reset")
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));
        quotas.for_class(class).update(remaining, reset);
    }
}

impl Default for RateClient {
    fn default() -> Self {
        #[allow(clippy::expect_used)]
        Self::new().expect("failed to build default RateClient")
    }
}

fn parse_header_u32(headers: &reqwest::header::HeaderMap, name: &str) -> Option<u32> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

fn parse_header_u64(headers: &reqwest::header::HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

fn to_unix(t: SystemTime) -> Option<u64> {
    t.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> RateClient {
        RateClient::with_config(RateClientConfig::with_url(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_get_returns_none_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result: Option<serde_json::Value> =
            client.get("repos/octocat/missing", &[]).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_get_parses_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello-world"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"stargazers_count": 42}))
                    .insert_header("x-ratelimit-remaining", "4999")
                    .insert_header("x-ratelimit-reset", "1700000000"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result: Option<serde_json::Value> = client
            .get("repos/octocat/hello-world", &[])
            .await
            .unwrap();
        assert_eq!(result.unwrap()["stargazers_count"], 42);

        let stats = client.stats().await;
        assert_eq!(stats.core_remaining, Some(4999));
        assert_eq!(stats.total_requests, 1);
    }

    #[tokio::test]
    async fn test_safety_floor_aborts_core_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/a"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .insert_header("x-ratelimit-remaining", "499")
                    .insert_header("x-ratelimit-reset", "1700000000"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let _: Option<serde_json::Value> = client.get("repos/octocat/a", &[]).await.unwrap();

        // The tracker now reports 499 remaining, below the default floor of 500.
        let err = client
            .get::<serde_json::Value>("repos/octocat/b", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimitExceeded { .. }));
    }

    #[tokio::test]
    async fn test_search_class_does_not_abort_on_low_quota() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"items": []}))
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", "1700000000"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let _: Option<serde_json::Value> = client
            .get("search/repositories", &[("q", "stars:>=2000".to_string())])
            .await
            .unwrap();

        // A second call should still be attempted (only a warning, no abort).
        let result: Option<serde_json::Value> = client
            .get("search/repositories", &[("q", "stars:>=2000".to_string())])
            .await
            .unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_403_with_zero_remaining_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/throttled"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", "1700000000"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .get::<serde_json::Value>("repos/octocat/throttled", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimitExceeded { .. }));
    }
}
