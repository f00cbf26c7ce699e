//! Per-endpoint-class quota tracking.
//!
//! The upstream API enforces two independent rate-limit buckets: a generous
//! "core" bucket for most REST endpoints and GraphQL, and a much smaller
//! "search" bucket. Treating them as one budget exhausts the search bucket
//! silently and looks like a general outage, so each gets its own tracker.

use std::time::{Duration, SystemTime};

/// Which rate-limit bucket an endpoint falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    /// The small-quota `search/...` endpoints.
    Search,
    /// Everything else, including `graphql`.
    Core,
}

impl EndpointClass {
    /// Classify a request path by URL prefix, per the design's dual-budget
    /// rule.
    pub fn classify(path: &str) -> Self {
        if path.trim_start_matches('/').starts_with("search/") {
            EndpointClass::Search
        } else {
            EndpointClass::Core
        }
    }
}

/// Remaining-calls/reset-time state for one endpoint class.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaState {
    /// Remaining calls in the current window, if known.
    pub remaining: Option<u32>,
    /// When the current window resets, if known.
    pub reset_at: Option<SystemTime>,
}

impl QuotaState {
    /// Update from response headers. `None` values leave the field
    /// unchanged, since not every response carries fresh headers.
    pub fn update(&mut self, remaining: Option<u32>, reset_at: Option<SystemTime>) {
        if let Some(remaining) = remaining {
            self.remaining = Some(remaining);
        }
        if let Some(reset_at) = reset_at {
            self.reset_at = Some(reset_at);
        }
    }

    /// Seconds until reset, clamped to zero, for diagnostics.
    pub fn seconds_until_reset(&self) -> Option<u64> {
        self.reset_at.map(|reset| {
            reset
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO)
                .as_secs()
        })
    }
}

/// Both quota trackers, guarded together so the pre-call guard and the
/// post-call update form one critical section (see the design notes on
/// sharing a client across concurrent callers).
#[derive(Debug, Clone, Copy, Default)]
pub struct Quotas {
    /// Core-class quota state.
    pub core: QuotaState,
    /// Search-class quota state.
    pub search: QuotaState,
}

impl Quotas {
    /// The tracker for a given endpoint class.
    pub fn for_class(&mut self, class: EndpointClass) -> &mut QuotaState {
        match class {
            EndpointClass::Core => &mut self.core,
            EndpointClass::Search => &mut self.search,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_search_endpoint() {
        assert_eq!(
            EndpointClass::classify("search/repositories"),
            EndpointClass::Search
        );
        assert_eq!(
            EndpointClass::classify("/search/issues"),
            EndpointClass::Search
        );
    }

    #[test]
    fn test_classify_core_endpoint() {
        assert_eq!(
            EndpointClass::classify("repos/octocat/hello-world"),
            EndpointClass::Core
        );
        assert_eq!(EndpointClass::classify("graphql"), EndpointClass::Core);
    }

    #[test]
    fn test_quota_update_preserves_unset_fields() {
        let mut state = QuotaState::default();
        state.update(Some(499), None);
        assert_eq!(state.remaining, Some(499));
        assert!(state.reset_at.is_none());

        let reset = SystemTime::now() + Duration::from_secs(60);
        state.update(None, Some(reset));
        assert_eq!(state.remaining, Some(499));
        assert_eq!(state.reset_at, Some(reset));
    }
}
