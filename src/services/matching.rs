use crate::core::Matcher;
use crate::models::{
    ExperienceLevel, MatchOutcome, PartnerSummary, Partnership, UserLocation,
};
use crate::services::cache::{CacheError, CacheKey, CacheManager};
use crate::services::postgres::{PostgresClient, StoreError};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by `request_match`.
///
/// Empty candidate sets are not errors — they terminate as
/// `MatchOutcome::NoCandidates`. `PendingConflict` from the store is
/// resolved internally and never reaches callers.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("user {0} is not registered")]
    UserNotFound(Uuid),

    #[error("matching temporarily unavailable: {0}")]
    Unavailable(#[from] StoreError),
}

/// Orchestrates a single match request: throttle check, candidate
/// discovery, filtering, selection, and idempotent persistence.
///
/// Stateless per request; any number of calls may run concurrently across
/// users. The only shared mutable resource is the partnership store, whose
/// constraints arbitrate races.
#[derive(Clone)]
pub struct MatchingService {
    store: Arc<PostgresClient>,
    cache: Arc<CacheManager>,
    matcher: Matcher,
    candidate_limit: i64,
}

impl MatchingService {
    pub fn new(
        store: Arc<PostgresClient>,
        cache: Arc<CacheManager>,
        matcher: Matcher,
        candidate_limit: i64,
    ) -> Self {
        Self {
            store,
            cache,
            matcher,
            candidate_limit,
        }
    }

    /// Find (or return the already-pending) accountability partner for a
    /// user.
    ///
    /// Call flow: throttle check → geo query → eligibility filter →
    /// deterministic selection → idempotent persistence. Repeated calls
    /// while a pending partnership exists return that same partnership,
    /// which makes retries safe for callers.
    pub async fn request_match(&self, user_id: Uuid) -> Result<MatchOutcome, MatchError> {
        // Throttle: an active pending partnership short-circuits discovery
        if let Some(existing) = self.store.find_pending_for(user_id).await? {
            tracing::info!(
                "User {} already has pending partnership {}",
                user_id,
                existing.id
            );
            return self.existing_outcome(user_id, existing).await;
        }

        if !self.store.user_exists(user_id).await? {
            return Err(MatchError::UserNotFound(user_id));
        }

        // Missing location means nobody can be in range — a normal outcome
        let Some(location) = self.requester_location(user_id).await? else {
            tracing::info!("User {} has no stored location", user_id);
            return Ok(MatchOutcome::NoCandidates);
        };

        // A requester without an experience level is ineligible, same as a
        // candidate without one
        let Some(level) = self.requester_level(user_id).await? else {
            tracing::info!("User {} has no experience level on file", user_id);
            return Ok(MatchOutcome::NoCandidates);
        };

        let radius = self.matcher.effective_radius(location.max_travel_miles);

        let candidates = self
            .store
            .candidates_within(&location, radius, self.candidate_limit)
            .await?;

        if candidates.is_empty() {
            tracing::info!("No candidates within {} miles of {}", radius, user_id);
            return Ok(MatchOutcome::NoCandidates);
        }

        let candidate_ids: Vec<Uuid> = candidates.iter().map(|c| c.user_id).collect();
        let levels = self.store.get_experience_levels(&candidate_ids).await?;

        let since = chrono::Utc::now()
            - chrono::Duration::days(self.matcher.policy().recency_days);
        let recent_partners = self.store.recent_partner_ids(user_id, since).await?;

        let Some(best) = self
            .matcher
            .evaluate(user_id, level, &candidates, &levels, &recent_partners)
        else {
            tracing::info!(
                "All {} candidates for {} filtered out",
                candidates.len(),
                user_id
            );
            return Ok(MatchOutcome::NoCandidates);
        };

        // Explicit dependency step before the FK-bearing insert
        self.store
            .ensure_profiles(&[user_id, best.user_id])
            .await?;

        match self.store.create_pending(user_id, best.user_id).await {
            Ok(partnership) => {
                let partner = PartnerSummary {
                    user_id: best.user_id,
                    experience_level: Some(best.experience_level),
                    distance_miles: Some(best.distance_miles),
                    city: self.store.get_city(best.user_id).await?,
                };
                Ok(MatchOutcome::Matched {
                    partnership,
                    partner,
                    existing: false,
                })
            }
            Err(StoreError::PendingConflict) => {
                // A concurrent request won the insert race. Return the
                // winner's row instead of failing the caller.
                tracing::info!(
                    "Pending conflict for {}; re-reading winning partnership",
                    user_id
                );
                match self.store.find_pending_for(user_id).await? {
                    Some(existing) => self.existing_outcome(user_id, existing).await,
                    // The partner was claimed by a third user and the
                    // requester holds nothing: report retryable
                    None => Err(MatchError::Unavailable(StoreError::PendingConflict)),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The user's current pending partnership, if any (throttle read,
    /// exposed for the scheduling collaborator).
    pub async fn pending_for(&self, user_id: Uuid) -> Result<Option<Partnership>, MatchError> {
        Ok(self.store.find_pending_for(user_id).await?)
    }

    /// Build the `Matched { existing: true }` outcome for a partnership
    /// found via the throttle. Distance is recomputed from stored
    /// locations when both are present.
    async fn existing_outcome(
        &self,
        user_id: Uuid,
        partnership: Partnership,
    ) -> Result<MatchOutcome, MatchError> {
        let partner_id = partnership.partner_of(user_id);

        let experience_level = self.store.get_experience_level(partner_id).await?;
        let city = self.store.get_city(partner_id).await?;

        let distance_miles = match (
            self.requester_location(user_id).await?,
            self.store.get_location(partner_id).await?,
        ) {
            (Some(a), Some(b)) => Some(crate::core::haversine_miles(
                a.latitude,
                a.longitude,
                b.latitude,
                b.longitude,
            )),
            _ => None,
        };

        Ok(MatchOutcome::Matched {
            partnership,
            partner: PartnerSummary {
                user_id: partner_id,
                experience_level,
                distance_miles,
                city,
            },
            existing: true,
        })
    }

    /// Read-through cached location lookup. Cache failures degrade to a
    /// store read; only present rows are cached.
    async fn requester_location(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserLocation>, MatchError> {
        let key = CacheKey::location(user_id);

        match self.cache.get::<UserLocation>(&key).await {
            Ok(location) => return Ok(Some(location)),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Location cache read failed ({}), using store", e),
        }

        let location = self.store.get_location(user_id).await?;

        if let Some(ref loc) = location {
            if let Err(e) = self.cache.set(&key, loc).await {
                tracing::warn!("Failed to cache location for {}: {}", user_id, e);
            }
        }

        Ok(location)
    }

    /// Read-through cached experience-level lookup.
    async fn requester_level(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ExperienceLevel>, MatchError> {
        let key = CacheKey::profile(user_id);

        match self.cache.get::<ExperienceLevel>(&key).await {
            Ok(level) => return Ok(Some(level)),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Profile cache read failed ({}), using store", e),
        }

        let level = self.store.get_experience_level(user_id).await?;

        if let Some(ref lvl) = level {
            if let Err(e) = self.cache.set(&key, lvl).await {
                tracing::warn!("Failed to cache profile for {}: {}", user_id, e);
            }
        }

        Ok(level)
    }
}
