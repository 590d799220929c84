use crate::core::distance::{calculate_bounding_box, haversine_miles};
use crate::models::{
    canonical_pair, ExperienceLevel, Partnership, PartnershipStatus, RawCandidate, UserLocation,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    /// A unique constraint rejected a concurrent pending-partnership
    /// insert. Resolved by the orchestrator, never surfaced to callers.
    #[error("pending partnership already exists for one of the participants")]
    PendingConflict,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

fn partnership_from_row(row: &PgRow) -> Partnership {
    Partnership {
        id: row.get("id"),
        participant_a: row.get("participant_a"),
        participant_b: row.get("participant_b"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL client for the matching core.
///
/// Owns the partnership store and reads the collaborator-owned location
/// and profile tables. The "one pending partnership per user" invariant is
/// enforced here at the storage layer (the `pending_participants` primary
/// key), not by application-level check-then-insert.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, StoreError> {
        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Whether a user is known to the registry at all. Missing location or
    /// profile rows are normal-empty states; a missing registry row is a
    /// client error upstream.
    pub async fn user_exists(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Fetch the stored location for a user, if any.
    pub async fn get_location(&self, user_id: Uuid) -> Result<Option<UserLocation>, StoreError> {
        let query = r#"
            SELECT user_id, latitude, longitude, city, max_travel_miles
            FROM user_locations
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| UserLocation {
            user_id: row.get("user_id"),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            city: row.get("city"),
            max_travel_miles: row.get("max_travel_miles"),
        }))
    }

    /// Candidates within `radius_miles` of the given location.
    ///
    /// Two-stage geo query: a cheap lat/lon bounding-box window in SQL,
    /// then exact haversine distances in Rust. The requester is excluded
    /// in SQL. Returns an empty vec when nobody is in range.
    pub async fn candidates_within(
        &self,
        origin: &UserLocation,
        radius_miles: f64,
        limit: i64,
    ) -> Result<Vec<RawCandidate>, StoreError> {
        let bbox = calculate_bounding_box(origin.latitude, origin.longitude, radius_miles);

        let query = r#"
            SELECT user_id, latitude, longitude
            FROM user_locations
            WHERE user_id <> $1
              AND latitude BETWEEN $2 AND $3
              AND longitude BETWEEN $4 AND $5
            LIMIT $6
        "#;

        let rows = sqlx::query(query)
            .bind(origin.user_id)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lon)
            .bind(bbox.max_lon)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let candidates: Vec<RawCandidate> = rows
            .iter()
            .filter_map(|row| {
                let user_id: Uuid = row.get("user_id");
                let lat: f64 = row.get("latitude");
                let lon: f64 = row.get("longitude");

                let distance_miles =
                    haversine_miles(origin.latitude, origin.longitude, lat, lon);

                // The bounding box over-approximates the circle
                if distance_miles <= radius_miles {
                    Some(RawCandidate {
                        user_id,
                        distance_miles,
                    })
                } else {
                    None
                }
            })
            .collect();

        tracing::debug!(
            "Geo query for {} found {} candidates within {} miles",
            origin.user_id,
            candidates.len(),
            radius_miles
        );

        Ok(candidates)
    }

    /// Experience level of a single user, if they have a profile with one.
    pub async fn get_experience_level(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ExperienceLevel>, StoreError> {
        let row = sqlx::query("SELECT experience_level FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|row| row.get::<Option<ExperienceLevel>, _>("experience_level")))
    }

    /// Batched experience-level lookup for a candidate set. Users without a
    /// profile (or without a level) are simply absent from the map.
    pub async fn get_experience_levels(
        &self,
        user_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ExperienceLevel>, StoreError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = r#"
            SELECT user_id, experience_level
            FROM user_profiles
            WHERE user_id = ANY($1) AND experience_level IS NOT NULL
        "#;

        let rows = sqlx::query(query)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                (
                    row.get::<Uuid, _>("user_id"),
                    row.get::<ExperienceLevel, _>("experience_level"),
                )
            })
            .collect())
    }

    /// City label for a user, used in partner summaries.
    pub async fn get_city(&self, user_id: Uuid) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT city FROM user_locations WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|row| row.get::<Option<String>, _>("city")))
    }

    /// Ids of everyone the user was partnered with since `since`,
    /// regardless of partnership status. One batched query per request so
    /// the filter never pays an N+1 cost.
    pub async fn recent_partner_ids(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<HashSet<Uuid>, StoreError> {
        let query = r#"
            SELECT participant_a, participant_b
            FROM partnerships
            WHERE (participant_a = $1 OR participant_b = $1)
              AND created_at >= $2
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let a: Uuid = row.get("participant_a");
                let b: Uuid = row.get("participant_b");
                if a == user_id {
                    b
                } else {
                    a
                }
            })
            .collect())
    }

    /// The user's active pending partnership, if one exists (throttle read).
    pub async fn find_pending_for(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Partnership>, StoreError> {
        let query = r#"
            SELECT id, participant_a, participant_b, status, created_at
            FROM partnerships
            WHERE (participant_a = $1 OR participant_b = $1)
              AND status = $2
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .bind(PartnershipStatus::Pending)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(partnership_from_row))
    }

    /// Explicit dependency step: materialize missing profile rows for the
    /// given users so foreign keys on the partnership insert never fail.
    /// Idempotent; existing rows are left untouched.
    pub async fn ensure_profiles(&self, user_ids: &[Uuid]) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO user_profiles (user_id)
            SELECT unnest($1::uuid[])
            ON CONFLICT (user_id) DO NOTHING
        "#;

        sqlx::query(query)
            .bind(user_ids)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create a pending partnership between two users.
    ///
    /// The pair is canonicalized before writing. The insert and the two
    /// `pending_participants` rows commit in one transaction; the table's
    /// primary key is what makes "at most one pending partnership per
    /// user" hold under concurrent requests. A unique violation on any of
    /// the statements rolls the transaction back and maps to
    /// `StoreError::PendingConflict` for the orchestrator to resolve by
    /// re-reading the winning row.
    pub async fn create_pending(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Partnership, StoreError> {
        let (participant_a, participant_b) = canonical_pair(user_a, user_b);
        let id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;

        let insert_partnership = r#"
            INSERT INTO partnerships (id, participant_a, participant_b, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, participant_a, participant_b, status, created_at
        "#;

        let row = sqlx::query(insert_partnership)
            .bind(id)
            .bind(participant_a)
            .bind(participant_b)
            .bind(PartnershipStatus::Pending)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::PendingConflict
                } else {
                    StoreError::SqlxError(e)
                }
            })?;

        let partnership = partnership_from_row(&row);

        let insert_participants = r#"
            INSERT INTO pending_participants (user_id, partnership_id)
            VALUES ($1, $3), ($2, $3)
        "#;

        sqlx::query(insert_participants)
            .bind(participant_a)
            .bind(participant_b)
            .bind(partnership.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::PendingConflict
                } else {
                    StoreError::SqlxError(e)
                }
            })?;

        tx.commit().await?;

        tracing::info!(
            "Created pending partnership {} for ({}, {})",
            partnership.id,
            participant_a,
            participant_b
        );

        Ok(partnership)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
