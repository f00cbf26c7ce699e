//! `GET /metrics` — Prometheus scrape endpoint, feature-gated.

use axum::Router;

use crate::state::AppState;

#[cfg(feature = "metrics")]
pub fn routes() -> Router<AppState> {
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;

    async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
        match state.metrics.as_deref().map(|m| m.encode()) {
            Some(Ok(body)) => (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            ),
            Some(Err(e)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                format!("failed to encode metrics: {e}").into_bytes(),
            ),
            None => (
                StatusCode::NOT_FOUND,
                [("content-type", "text/plain; charset=utf-8")],
                b"metrics not enabled".to_vec(),
            ),
        }
    }

    Router::new().route("/metrics", get(prometheus_metrics))
}

#[cfg(not(feature = "metrics"))]
pub fn routes() -> Router<AppState> {
    use axum::routing::get;

    Router::new().route(
        "/metrics",
        get(|| async {
            (
                axum::http::StatusCode::NOT_FOUND,
                "metrics feature not enabled; rebuild with --features metrics",
            )
        }),
    )
}
