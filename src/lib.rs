//! Wingman Match - matching service for in-person accountability partnerships
//!
//! This library pairs users with nearby accountability partners ("wingmen")
//! by geographic proximity, experience-level compatibility, and recent
//! pairing history, then persists the resulting partnership idempotently.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    distance::{calculate_bounding_box, haversine_miles},
    select_best, MatchPolicy, Matcher,
};
pub use models::{
    canonical_pair, Candidate, ExperienceLevel, MatchOutcome, MatchResponse, PartnerSummary,
    Partnership, PartnershipStatus, RawCandidate, UserLocation,
};
