use crate::models::{Candidate, ExperienceLevel, RawCandidate};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Check if two experience levels are compatible.
///
/// Adjacency rule: |rank(a) - rank(b)| <= 1. Beginners pair with beginners
/// and intermediates, intermediates with anyone, advanced with
/// intermediates and advanced — never beginner with advanced.
#[inline]
pub fn is_experience_compatible(a: ExperienceLevel, b: ExperienceLevel) -> bool {
    a.is_compatible_with(b)
}

/// Remove ineligible candidates from a geo-query result.
///
/// A candidate survives when all of the following hold:
/// - it is not the requester;
/// - it has a known experience level (`levels` entry), compatible with the
///   requester's;
/// - it was not recently partnered with the requester (`recent_partners`,
///   fetched as one batched store query per request).
///
/// Pure function over its inputs; candidates without a profile are dropped
/// rather than defaulted.
pub fn filter_candidates(
    requester_id: Uuid,
    requester_level: ExperienceLevel,
    candidates: &[RawCandidate],
    levels: &HashMap<Uuid, ExperienceLevel>,
    recent_partners: &HashSet<Uuid>,
) -> Vec<Candidate> {
    candidates
        .iter()
        .filter(|c| c.user_id != requester_id)
        .filter(|c| !recent_partners.contains(&c.user_id))
        .filter_map(|c| {
            let level = *levels.get(&c.user_id)?;
            if is_experience_compatible(requester_level, level) {
                Some(Candidate {
                    user_id: c.user_id,
                    distance_miles: c.distance_miles,
                    experience_level: level,
                })
            } else {
                None
            }
        })
        .collect()
}
