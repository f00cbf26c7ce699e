//! Route modules, nested under their resource prefixes.

pub mod health;
pub mod jobs;
pub mod metrics;
pub mod repos;
pub mod status;
pub mod universe;
pub mod watchlist;

use axum::Router;

use crate::state::AppState;

/// The full API, ready to be layered with middleware.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(metrics::routes())
        .nest("/v1/jobs", jobs::routes())
        .nest("/v1/status", status::routes())
        .nest("/v1/repos", repos::routes())
        .nest("/v1/universe", universe::routes())
        .nest("/v1/watchlist", watchlist::routes())
        .with_state(state)
}
