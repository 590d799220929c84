use crate::models::domain::{PartnerSummary, Partnership};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for the match request endpoint.
///
/// `matched: true` carries the partnership and partner summary; a
/// `matched: false` response carries a machine-readable reason instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "partnershipId", skip_serializing_if = "Option::is_none")]
    pub partnership_id: Option<Uuid>,
    #[serde(rename = "partnerId", skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<Uuid>,
    #[serde(rename = "partnerSummary", skip_serializing_if = "Option::is_none")]
    pub partner_summary: Option<PartnerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<bool>,
}

impl MatchResponse {
    pub fn matched(partnership: &Partnership, partner: PartnerSummary, existing: bool) -> Self {
        Self {
            matched: true,
            reason: None,
            partnership_id: Some(partnership.id),
            partner_id: Some(partner.user_id),
            partner_summary: Some(partner),
            existing: Some(existing),
        }
    }

    pub fn unmatched(reason: &str) -> Self {
        Self {
            matched: false,
            reason: Some(reason.to_string()),
            partnership_id: None,
            partner_id: None,
            partner_summary: None,
            existing: None,
        }
    }
}

/// Response for the pending-partnership lookup endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingResponse {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<Partnership>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
