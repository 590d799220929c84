use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Self-reported experience level, used for compatibility filtering.
///
/// Levels are a closed set with an explicit rank so compatibility is an
/// adjacency check, not a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "experience_level", rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    /// Numeric rank: beginner=1, intermediate=2, advanced=3.
    pub fn rank(self) -> i8 {
        match self {
            ExperienceLevel::Beginner => 1,
            ExperienceLevel::Intermediate => 2,
            ExperienceLevel::Advanced => 3,
        }
    }

    /// Two levels are compatible iff they are at most one rank apart.
    /// Beginner and advanced are never paired.
    pub fn is_compatible_with(self, other: ExperienceLevel) -> bool {
        (self.rank() - other.rank()).abs() <= 1
    }
}

/// Partnership lifecycle state. This service only ever creates rows in
/// `Pending`; accept/decline transitions belong to a downstream collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "partnership_status", rename_all = "lowercase")]
pub enum PartnershipStatus {
    Pending,
    Accepted,
    Declined,
}

/// Stored location for a user, written by the profile-setup collaborator
/// and read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLocation {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(rename = "maxTravelMiles", default)]
    pub max_travel_miles: Option<f64>,
}

/// Geo-query output: a user in range, annotated with great-circle distance.
#[derive(Debug, Clone)]
pub struct RawCandidate {
    pub user_id: Uuid,
    pub distance_miles: f64,
}

/// A candidate that survived eligibility filtering. Transient, per-request,
/// never persisted.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub user_id: Uuid,
    pub distance_miles: f64,
    pub experience_level: ExperienceLevel,
}

/// Persisted outcome of a successful match. Participants are always stored
/// in canonical order (smaller UUID first) so an unordered pair has exactly
/// one representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partnership {
    pub id: Uuid,
    #[serde(rename = "participantA")]
    pub participant_a: Uuid,
    #[serde(rename = "participantB")]
    pub participant_b: Uuid,
    pub status: PartnershipStatus,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Partnership {
    /// The other participant, from one participant's point of view.
    pub fn partner_of(&self, user_id: Uuid) -> Uuid {
        if self.participant_a == user_id {
            self.participant_b
        } else {
            self.participant_a
        }
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }
}

/// Order two participant ids canonically: smaller UUID first.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Summary of the matched partner returned to the caller. Distance is a
/// derived display value, recomputed when both locations are known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerSummary {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "experienceLevel")]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(rename = "distanceMiles", skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Terminal outcome of a `request_match` call. Absence of candidates is a
/// normal outcome, not an error.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Matched {
        partnership: Partnership,
        partner: PartnerSummary,
        existing: bool,
    },
    NoCandidates,
}

/// Geospatial bounding box used to pre-filter the location store before
/// exact haversine distances are computed.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}
