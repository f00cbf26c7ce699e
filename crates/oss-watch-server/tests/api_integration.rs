//! Exercises the router directly via `tower::ServiceExt::oneshot`, without
//! binding a socket or making upstream network calls.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use oss_watch_client::RateClient;
use oss_watch_core::Config;
use oss_watch_server::{ApiConfig, ApiServer, AppState};
use oss_watch_store::InMemoryStore;
use tower::util::ServiceExt;

fn test_state() -> AppState {
    AppState {
        store: Arc::new(InMemoryStore::new()),
        client: Arc::new(RateClient::new().unwrap()),
        config: Arc::new(Config::default()),
    }
}

fn test_router() -> axum::Router {
    let state = test_state();
    let config = ApiConfig::from_state(&state).unwrap();
    ApiServer::new(state, config).router()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let router = test_router();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_ready_endpoint_reports_store_ok() {
    let router = test_router();
    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ready"], true);
}

#[tokio::test]
async fn test_status_endpoint_redacts_token() {
    let mut config = Config::default();
    config.github_token = "ghp_supersecret".to_string();
    let state = AppState {
        store: Arc::new(InMemoryStore::new()),
        client: Arc::new(RateClient::new().unwrap()),
        config: Arc::new(config),
    };
    let api_config = ApiConfig::from_state(&state).unwrap();
    let router = ApiServer::new(state, api_config).router();

    let request = Request::builder().uri("/v1/status").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["config"]["github_token"], "[redacted]");
    assert!(json["last_job_runs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_repos_empty_store() {
    let router = test_router();
    let request = Request::builder().uri("/v1/repos").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 0);
    assert!(json["repos"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_repo_not_found() {
    let router = test_router();
    let request = Request::builder()
        .uri("/v1/repos/octocat/hello-world")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_deep_analysis_rejects_out_of_range_max_repos() {
    let router = test_router();
    let request = Request::builder()
        .uri("/v1/jobs/deep-analysis")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"max_repos": 0}"#))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_watchlist_latest_with_empty_store_returns_empty_entries() {
    let router = test_router();
    let request = Request::builder()
        .uri("/v1/watchlist/latest")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_watchlist_latest_rejects_unknown_sort() {
    let router = test_router();
    let request = Request::builder()
        .uri("/v1/watchlist/latest?sort=bogus")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_watchlist_dates_empty_store() {
    let router = test_router();
    let request = Request::builder().uri("/v1/watchlist/dates").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["dates"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_universe_stats_empty_store() {
    let router = test_router();
    let request = Request::builder().uri("/v1/universe/stats").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total_repos"], 0);
    assert_eq!(json["eligible_repos"], 0);
    assert_eq!(json["ineligible_repos"], 0);
    assert!(json["language_breakdown"].as_array().unwrap().is_empty());
    assert!(json["last_update"]["discovery"].is_null());
    assert!(json["last_update"]["deep_analysis"].is_null());
    assert_eq!(json["universe_criteria"]["min_stars"], 2000);
}

#[tokio::test]
async fn test_queue_refresh_job_completes_on_empty_store() {
    let router = test_router();
    let request = Request::builder()
        .uri("/v1/jobs/queue-refresh")
        .method("POST")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "completed");
}
