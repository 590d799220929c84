use crate::models::{
    ErrorResponse, HealthResponse, MatchOutcome, MatchResponse, PendingQuery, PendingResponse,
    RequestMatchRequest,
};
use crate::services::{MatchError, MatchingService, PostgresClient};
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PostgresClient>,
    pub service: MatchingService,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/request", web::post().to(request_match))
        .route("/matches/pending", web::get().to(get_pending));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn parse_user_id(raw: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        HttpResponse::BadRequest().json(ErrorResponse {
            error: "invalid_user_id".to_string(),
            message: format!("'{}' is not a valid UUID", raw),
            status_code: 400,
        })
    })
}

/// Request a match endpoint
///
/// POST /api/v1/matches/request
///
/// Request body:
/// ```json
/// {
///   "userId": "string (uuid)"
/// }
/// ```
async fn request_match(
    state: web::Data<AppState>,
    req: web::Json<RequestMatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for request_match: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let user_id = match parse_user_id(&req.user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    tracing::info!("Match requested for user {}", user_id);

    match state.service.request_match(user_id).await {
        Ok(MatchOutcome::Matched {
            partnership,
            partner,
            existing,
        }) => {
            tracing::info!(
                "User {} matched with {} (partnership {}, existing: {})",
                user_id,
                partner.user_id,
                partnership.id,
                existing
            );
            HttpResponse::Ok().json(MatchResponse::matched(&partnership, partner, existing))
        }
        Ok(MatchOutcome::NoCandidates) => {
            HttpResponse::Ok().json(MatchResponse::unmatched("no_candidates"))
        }
        Err(MatchError::UserNotFound(_)) => {
            HttpResponse::NotFound().json(MatchResponse::unmatched("not_found"))
        }
        Err(MatchError::Unavailable(e)) => {
            tracing::error!("Match request for {} failed: {}", user_id, e);
            HttpResponse::ServiceUnavailable().json(MatchResponse::unmatched("unavailable"))
        }
    }
}

/// Pending partnership lookup
///
/// GET /api/v1/matches/pending?userId={userId}
///
/// Returns the user's active pending partnership, if one exists. Consumed
/// by the session-scheduling collaborator.
async fn get_pending(
    state: web::Data<AppState>,
    query: web::Query<PendingQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let user_id = match parse_user_id(&query.user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.service.pending_for(user_id).await {
        Ok(pending) => HttpResponse::Ok().json(PendingResponse { user_id, pending }),
        Err(e) => {
            tracing::error!("Pending lookup for {} failed: {}", user_id, e);
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "unavailable".to_string(),
                message: e.to_string(),
                status_code: 503,
            })
        }
    }
}
