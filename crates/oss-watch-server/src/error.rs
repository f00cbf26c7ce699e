//! Maps `oss_watch_core::Error` onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use oss_watch_core::Error;

use crate::types::ApiError;

/// Error codes used in [`ApiError::code`].
pub mod error_codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const UPSTREAM_UNAVAILABLE: &str = "UPSTREAM_UNAVAILABLE";
    pub const STORE_ERROR: &str = "STORE_ERROR";
    pub const CANCELLED: &str = "CANCELLED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Newtype wrapping `oss_watch_core::Error` so it can implement
/// `IntoResponse` from this crate.
pub struct ApiErrorResponse(pub Error);

impl From<Error> for ApiErrorResponse {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<serde_json::Error> for ApiErrorResponse {
    fn from(err: serde_json::Error) -> Self {
        Self(Error::from(err))
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            Error::RateLimitExceeded { .. } => (StatusCode::TOO_MANY_REQUESTS, error_codes::RATE_LIMITED),
            Error::UpstreamUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, error_codes::UPSTREAM_UNAVAILABLE),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
            Error::ValidationError(_) => (StatusCode::BAD_REQUEST, error_codes::VALIDATION_FAILED),
            Error::StoreError(_) => (StatusCode::BAD_GATEWAY, error_codes::STORE_ERROR),
            Error::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, error_codes::CANCELLED),
            Error::SerializationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR),
        };
        (status, Json(ApiError::new(code, self.0.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let resp = ApiErrorResponse(Error::NotFound("octocat/hello-world".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let err: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, error_codes::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validation_error_maps_to_400() {
        let resp = ApiErrorResponse(Error::ValidationError("max_repos must be in [1, 100]".to_string()))
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_429() {
        let resp = ApiErrorResponse(Error::RateLimitExceeded { retry_after_secs: Some(30) }).into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_store_error_maps_to_502() {
        let resp = ApiErrorResponse(Error::StoreError("connection reset".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_upstream_unavailable_maps_to_503() {
        let resp = ApiErrorResponse(Error::UpstreamUnavailable("timeout".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
