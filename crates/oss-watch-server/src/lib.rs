//! HTTP trigger/read surface for the OSS Watch pipelines.
//!
//! Thin `axum` wrapper: every route calls straight into `oss-watch-pipelines`
//! or reads from the `Store`, the same way `oss-watch-cli`'s subcommands do.

pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod routes;
pub mod server;
pub mod state;
pub mod types;

pub use server::{ApiConfig, ApiServer};
pub use state::AppState;
