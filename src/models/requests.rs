use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to find an accountability partner for a user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RequestMatchRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

/// Query parameters for the pending-partnership lookup.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PendingQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}
