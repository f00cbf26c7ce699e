//! Discovery, QueueManager, DeepAnalysis, and WatchlistGenerator: the four
//! pipelines that turn upstream repository data into the watchlist.

mod deep_analysis;
mod discovery;
mod eligibility;
mod linreg;
mod queue_manager;
mod signals;
mod upstream;
mod watchlist_generator;

pub use deep_analysis::{DeepAnalysis, DeepAnalysisStats, StopReason};
pub use discovery::{Discovery, DiscoveryStats};
pub use eligibility::{is_eligible, EligibilityInput};
pub use queue_manager::{classify_priority, QueueManager, QueueRefreshStats};
pub use watchlist_generator::{WatchlistGenerator, WatchlistStats};
