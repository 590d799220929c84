use crate::models::Candidate;
use std::cmp::Ordering;

/// Pick the single best candidate: nearest by distance, ties broken by
/// ascending user id so identical inputs always produce the same winner.
///
/// Returns `None` for an empty list — a normal outcome, not an error.
pub fn select_best(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.into_iter().min_by(|a, b| {
        a.distance_miles
            .partial_cmp(&b.distance_miles)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.user_id.cmp(&b.user_id))
    })
}
