//! Shared data model, error taxonomy, and configuration for OSS Watch.
//!
//! This crate has no knowledge of HTTP or storage; it exists so
//! `oss-watch-client`, `oss-watch-store`, and `oss-watch-pipelines` can share
//! one vocabulary without depending on each other.

pub mod config;
pub mod error;
pub mod model;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{
    Adoption, Availability, CommunityRisk, ContributionDistribution, ContributorHealth,
    DeepSnapshot, DiscoverySnapshot, JobRun, JobStatus, JobType, PriorityReason, QueueEntry, Repo,
    Responsiveness, Velocity, WatchlistEntry, WatchlistSort,
};
