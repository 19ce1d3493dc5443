use crate::domain::trip::UserPreferences;
use anyhow::Context;
use sqlx::types::Json;

pub async fn get(pool: &sqlx::PgPool, user_id: &str) -> anyhow::Result<Option<UserPreferences>> {
    let row: Option<Json<UserPreferences>> =
        sqlx::query_scalar("SELECT preferences FROM user_preferences WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .context("select user_preferences failed")?;
    Ok(row.map(|Json(p)| p))
}

pub async fn put(
    pool: &sqlx::PgPool,
    user_id: &str,
    preferences: &UserPreferences,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO user_preferences (user_id, preferences, updated_at) \
         VALUES ($1, $2, now()) \
         ON CONFLICT (user_id) DO UPDATE SET preferences = EXCLUDED.preferences, updated_at = now()",
    )
    .bind(user_id)
    .bind(Json(preferences))
    .execute(pool)
    .await
    .context("upsert user_preferences failed")?;
    Ok(())
}
