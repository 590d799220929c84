// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    canonical_pair, BoundingBox, Candidate, ExperienceLevel, MatchOutcome, PartnerSummary,
    Partnership, PartnershipStatus, RawCandidate, UserLocation,
};
pub use requests::{PendingQuery, RequestMatchRequest};
pub use responses::{ErrorResponse, HealthResponse, MatchResponse, PendingResponse};
