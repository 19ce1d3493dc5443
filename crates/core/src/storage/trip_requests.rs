use crate::domain::trip::{TripConstraints, TripRequestStatus};
use anyhow::Context;
use sqlx::types::Json;

pub async fn insert(pool: &sqlx::PgPool, constraints: &TripConstraints) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO trip_requests (id, user_id, destination, constraints, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, 'pending', $5, $5)",
    )
    .bind(constraints.id)
    .bind(&constraints.user_id)
    .bind(&constraints.destination)
    .bind(Json(constraints))
    .bind(constraints.created_at)
    .execute(pool)
    .await
    .context("insert trip_requests failed")?;
    Ok(())
}

/// Moves a trip request to `status`. `error` and `raw_llm_output` are kept
/// only for failures; any other status clears them.
pub async fn set_status(
    pool: &sqlx::PgPool,
    id: uuid::Uuid,
    status: TripRequestStatus,
    error: Option<&str>,
    raw_llm_output: Option<&str>,
) -> anyhow::Result<()> {
    let failed = status == TripRequestStatus::Failed;
    let res = sqlx::query(
        "UPDATE trip_requests SET status = $2, error = $3, raw_llm_output = $4, updated_at = now() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(status.as_str())
    .bind(error.filter(|_| failed))
    .bind(raw_llm_output.filter(|_| failed))
    .execute(pool)
    .await
    .context("update trip_requests status failed")?;

    anyhow::ensure!(res.rows_affected() == 1, "trip request {id} not found");
    Ok(())
}
