use crate::domain::itinerary::Itinerary;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use uuid::Uuid;

/// Inserts or replaces the stored document for `itinerary.id`.
pub async fn upsert(pool: &sqlx::PgPool, itinerary: &Itinerary) -> anyhow::Result<()> {
    let version = i32::try_from(itinerary.version).context("itinerary version out of range")?;

    sqlx::query(
        "INSERT INTO itineraries (id, trip_request_id, user_id, destination, version, document, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (id) DO UPDATE SET \
           destination = EXCLUDED.destination, \
           version = EXCLUDED.version, \
           document = EXCLUDED.document, \
           updated_at = EXCLUDED.updated_at",
    )
    .bind(itinerary.id)
    .bind(itinerary.trip_request_id)
    .bind(&itinerary.user_id)
    .bind(&itinerary.destination)
    .bind(version)
    .bind(Json(itinerary))
    .bind(itinerary.created_at)
    .bind(itinerary.updated_at)
    .execute(pool)
    .await
    .context("upsert itineraries failed")?;
    Ok(())
}

pub async fn get(pool: &sqlx::PgPool, id: Uuid) -> anyhow::Result<Option<Itinerary>> {
    let row: Option<Json<Itinerary>> =
        sqlx::query_scalar("SELECT document FROM itineraries WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("select itineraries failed")?;
    Ok(row.map(|Json(it)| it))
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ItinerarySummary {
    pub id: Uuid,
    pub trip_request_id: Uuid,
    pub destination: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Newest first.
pub async fn list_for_user(
    pool: &sqlx::PgPool,
    user_id: &str,
) -> anyhow::Result<Vec<ItinerarySummary>> {
    sqlx::query_as::<_, ItinerarySummary>(
        "SELECT id, trip_request_id, destination, version, created_at, updated_at \
         FROM itineraries \
         WHERE user_id = $1 \
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("list itineraries failed")
}

/// Returns whether a row was removed.
pub async fn delete(pool: &sqlx::PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM itineraries WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("delete itineraries failed")?;
    Ok(res.rows_affected() > 0)
}
