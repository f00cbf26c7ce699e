//! Rate-limit-aware HTTP client for the upstream code-hosting API.
//!
//! Mediates all upstream traffic for the discovery/analysis pipelines,
//! tracking core and search quotas independently and enforcing a safety
//! floor on the core class (see the design notes on why the two buckets must
//! never be conflated).

pub mod client;
pub mod config;
pub mod quota;
pub mod retry;

pub use client::{RateClient, RateClientStats};
pub use config::RateClientConfig;
pub use quota::{EndpointClass, Quotas};
pub use retry::RetryPolicy;
