//! Typed persistence for repos, snapshots, queue entries, job runs, and
//! watchlists.
//!
//! The [`Store`] trait is the only thing pipelines depend on; [`InMemoryStore`]
//! backs tests and small deployments, and the `postgres` feature adds
//! [`PostgresStore`] for anything that needs to survive a restart.

pub mod in_memory;
pub mod trait_def;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use trait_def::{
    Page, QueueEntryUpdate, QueueEntryUpsertResult, QueueSummary, RepoFilter, RepoSort,
    RepoSortField, RepoUpsert, Store, UniverseStats,
};

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
