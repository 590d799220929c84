// Store-level tests for the partnership repository and throttle.
//
// These exercise the storage-layer constraints that arbitrate concurrent
// match requests, so they need a real PostgreSQL instance. Run with:
//
//   DATABASE_URL=postgres://... cargo test --test store_tests -- --ignored

use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;
use wingman_match::models::{canonical_pair, ExperienceLevel};
use wingman_match::services::{PostgresClient, StoreError};

fn database_url() -> String {
    std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for store tests")
}

async fn connect() -> (PostgresClient, PgPool) {
    let url = database_url();
    let client = PostgresClient::new(&url, 5, 1)
        .await
        .expect("Failed to connect PostgresClient");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect seed pool");
    (client, pool)
}

async fn seed_user(pool: &PgPool, lat: f64, lon: f64, level: Option<ExperienceLevel>) -> Uuid {
    let id = Uuid::new_v4();

    sqlx::query("INSERT INTO users (id, display_name) VALUES ($1, $2)")
        .bind(id)
        .bind(format!("test-{}", id))
        .execute(pool)
        .await
        .unwrap();

    sqlx::query(
        "INSERT INTO user_locations (user_id, latitude, longitude, max_travel_miles) \
         VALUES ($1, $2, $3, 25)",
    )
    .bind(id)
    .bind(lat)
    .bind(lon)
    .execute(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO user_profiles (user_id, experience_level) VALUES ($1, $2)")
        .bind(id)
        .bind(level)
        .execute(pool)
        .await
        .unwrap();

    id
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_create_pending_is_canonical() {
    let (client, pool) = connect().await;

    let a = seed_user(&pool, 37.77, -122.41, Some(ExperienceLevel::Beginner)).await;
    let b = seed_user(&pool, 37.78, -122.41, Some(ExperienceLevel::Beginner)).await;
    let (lo, hi) = canonical_pair(a, b);

    // Create with the arguments in non-canonical order on purpose
    let partnership = client.create_pending(hi, lo).await.unwrap();

    assert_eq!(partnership.participant_a, lo);
    assert_eq!(partnership.participant_b, hi);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_throttle_returns_existing_pending() {
    let (client, pool) = connect().await;

    let a = seed_user(&pool, 37.77, -122.41, Some(ExperienceLevel::Intermediate)).await;
    let b = seed_user(&pool, 37.78, -122.41, Some(ExperienceLevel::Intermediate)).await;

    let created = client.create_pending(a, b).await.unwrap();

    // Both participants observe the same pending row
    let for_a = client.find_pending_for(a).await.unwrap().unwrap();
    let for_b = client.find_pending_for(b).await.unwrap().unwrap();

    assert_eq!(for_a.id, created.id);
    assert_eq!(for_b.id, created.id);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_second_pending_for_same_user_conflicts() {
    let (client, pool) = connect().await;

    let a = seed_user(&pool, 37.77, -122.41, Some(ExperienceLevel::Advanced)).await;
    let b = seed_user(&pool, 37.78, -122.41, Some(ExperienceLevel::Advanced)).await;
    let c = seed_user(&pool, 37.79, -122.41, Some(ExperienceLevel::Advanced)).await;

    client.create_pending(a, b).await.unwrap();

    // a already holds a pending slot; pairing with c must be rejected by
    // the storage constraint, not by application logic
    let second = client.create_pending(a, c).await;
    assert!(matches!(second, Err(StoreError::PendingConflict)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_concurrent_creates_yield_exactly_one_partnership() {
    let (client, pool) = connect().await;

    let a = seed_user(&pool, 37.77, -122.41, Some(ExperienceLevel::Intermediate)).await;
    let b = seed_user(&pool, 37.78, -122.41, Some(ExperienceLevel::Intermediate)).await;
    let c = seed_user(&pool, 37.79, -122.41, Some(ExperienceLevel::Intermediate)).await;

    // Two racing requests for user a with different partners
    let (first, second) = tokio::join!(
        client.create_pending(a, b),
        client.create_pending(a, c),
    );

    let winners = [&first, &second]
        .iter()
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(winners, 1, "exactly one insert must win the race");

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(loser, Err(StoreError::PendingConflict)));

    // The loser's flow re-reads and returns the winner's row
    let pending = client.find_pending_for(a).await.unwrap().unwrap();
    let winner_id = [&pending.participant_a, &pending.participant_b]
        .into_iter()
        .find(|id| **id != a)
        .copied()
        .unwrap();
    assert!(winner_id == b || winner_id == c);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_recent_partner_ids_window() {
    let (client, pool) = connect().await;

    let a = seed_user(&pool, 37.77, -122.41, Some(ExperienceLevel::Beginner)).await;
    let b = seed_user(&pool, 37.78, -122.41, Some(ExperienceLevel::Beginner)).await;

    client.create_pending(a, b).await.unwrap();

    // Inside the window: the partner is excluded
    let recent = client
        .recent_partner_ids(a, Utc::now() - Duration::days(7))
        .await
        .unwrap();
    assert!(recent.contains(&b));

    // A window that starts in the future sees nothing
    let recent = client
        .recent_partner_ids(a, Utc::now() + Duration::minutes(1))
        .await
        .unwrap();
    assert!(recent.is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_geo_query_excludes_self_and_out_of_range() {
    let (client, pool) = connect().await;

    let requester = seed_user(&pool, 37.7749, -122.4194, Some(ExperienceLevel::Beginner)).await;
    let oakland = seed_user(&pool, 37.8044, -122.2712, Some(ExperienceLevel::Beginner)).await;
    // Los Angeles, far outside any reasonable radius
    let la = seed_user(&pool, 34.0522, -118.2437, Some(ExperienceLevel::Beginner)).await;

    let origin = client.get_location(requester).await.unwrap().unwrap();
    let candidates = client.candidates_within(&origin, 15.0, 250).await.unwrap();

    let ids: Vec<Uuid> = candidates.iter().map(|c| c.user_id).collect();
    assert!(ids.contains(&oakland));
    assert!(!ids.contains(&requester));
    assert!(!ids.contains(&la));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_ensure_profiles_is_idempotent() {
    let (client, pool) = connect().await;

    let a = seed_user(&pool, 37.77, -122.41, Some(ExperienceLevel::Advanced)).await;

    // b has a users row but no profile yet
    let b = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id) VALUES ($1)")
        .bind(b)
        .execute(&pool)
        .await
        .unwrap();

    client.ensure_profiles(&[a, b]).await.unwrap();
    client.ensure_profiles(&[a, b]).await.unwrap();

    // a's existing level is untouched, b's row exists with no level
    assert_eq!(
        client.get_experience_level(a).await.unwrap(),
        Some(ExperienceLevel::Advanced)
    );
    assert_eq!(client.get_experience_level(b).await.unwrap(), None);
}
