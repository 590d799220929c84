use crate::core::{filters::filter_candidates, selector::select_best};
use crate::models::{Candidate, ExperienceLevel, RawCandidate};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Policy knobs for a match request, sourced from configuration.
#[derive(Debug, Clone, Copy)]
pub struct MatchPolicy {
    /// Radius used when the requester has no stored travel preference.
    pub default_radius_miles: f64,
    /// Lower clamp for the search radius.
    pub min_radius_miles: f64,
    /// Upper clamp for the search radius.
    pub max_radius_miles: f64,
    /// Days during which a previously paired candidate is excluded.
    pub recency_days: i64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            default_radius_miles: 25.0,
            min_radius_miles: 1.0,
            max_radius_miles: 100.0,
            recency_days: 7,
        }
    }
}

/// Pure selection pipeline: eligibility filtering followed by deterministic
/// nearest-candidate selection. All I/O (geo query, profile and recency
/// lookups) happens before this point.
#[derive(Debug, Clone)]
pub struct Matcher {
    policy: MatchPolicy,
}

impl Matcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn with_default_policy() -> Self {
        Self {
            policy: MatchPolicy::default(),
        }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Resolve the search radius for a requester: their stored travel
    /// preference when present, the configured default otherwise, clamped
    /// to the allowed window.
    pub fn effective_radius(&self, max_travel_miles: Option<f64>) -> f64 {
        max_travel_miles
            .unwrap_or(self.policy.default_radius_miles)
            .clamp(self.policy.min_radius_miles, self.policy.max_radius_miles)
    }

    /// Run the filter-and-select pipeline over a prefetched candidate set.
    ///
    /// Returns the winning candidate, or `None` when nobody in range is
    /// eligible — a normal terminal state for the caller.
    pub fn evaluate(
        &self,
        requester_id: Uuid,
        requester_level: ExperienceLevel,
        candidates: &[RawCandidate],
        levels: &HashMap<Uuid, ExperienceLevel>,
        recent_partners: &HashSet<Uuid>,
    ) -> Option<Candidate> {
        let eligible = filter_candidates(
            requester_id,
            requester_level,
            candidates,
            levels,
            recent_partners,
        );
        select_best(eligible)
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_policy()
    }
}
