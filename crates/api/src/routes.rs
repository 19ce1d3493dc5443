use crate::error::ApiError;
use crate::AppState;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use wayfarer_core::advisory::{self, AdvisoryReport};
use wayfarer_core::domain::contract::{CostAdjustment, DayCountMismatch};
use wayfarer_core::domain::itinerary::Itinerary;
use wayfarer_core::domain::trip::{TripRequestDraft, TripRequestStatus, UserPreferences};
use wayfarer_core::pipeline::{EnrichmentReport, GenerationFailure};
use wayfarer_core::storage;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity forwarded by the identity proxy in front of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| UserId(v.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}

fn require_pool(state: &AppState) -> Result<&PgPool, ApiError> {
    state.pool.as_ref().ok_or(ApiError::Unavailable("database"))
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "database": state.pool.is_some(),
        "generation": state.generator.is_some(),
        "weather": state.weather.is_some(),
    }))
}

#[derive(Debug, Serialize)]
pub struct CreatedItinerary {
    trip_request_id: Uuid,
    itinerary: Itinerary,
    enrichment: EnrichmentReport,
    day_count_mismatch: Option<DayCountMismatch>,
    cost_adjustment: Option<CostAdjustment>,
}

pub async fn create_itinerary(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(mut draft): Json<TripRequestDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = require_pool(&state)?;
    let generator = state
        .generator
        .as_ref()
        .ok_or(ApiError::Unavailable("itinerary generation"))?;

    match storage::preferences::get(pool, &user_id).await {
        Ok(Some(prefs)) => prefs.apply_to(&mut draft),
        Ok(None) => {}
        Err(e) => tracing::warn!(%user_id, error = %format!("{e:#}"), "could not load preferences"),
    }

    let constraints = draft
        .into_constraints(&user_id)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    storage::trip_requests::insert(pool, &constraints).await?;
    storage::trip_requests::set_status(
        pool,
        constraints.id,
        TripRequestStatus::Generating,
        None,
        None,
    )
    .await?;

    let outcome = generator.generate(&constraints).await;
    let recorded = storage::outcome::record(pool, constraints.id, &outcome).await;

    let generation = match outcome {
        Ok(g) => g,
        Err(failure) => {
            tracing::error!(
                trip_request_id = %constraints.id,
                kind = failure.kind(),
                error = %failure,
                "itinerary generation failed"
            );
            if let Err(e) = recorded {
                tracing::error!(
                    trip_request_id = %constraints.id,
                    error = %format!("{e:#}"),
                    "could not record generation failure"
                );
            }
            return Err(match failure {
                GenerationFailure::InvalidConstraints(e) => ApiError::BadRequest(e.to_string()),
                other => ApiError::BadGateway {
                    error: "could not generate itinerary",
                    details: other.to_string(),
                },
            });
        }
    };
    recorded?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedItinerary {
            trip_request_id: constraints.id,
            itinerary: generation.itinerary,
            enrichment: generation.enrichment,
            day_count_mismatch: generation.day_count_mismatch,
            cost_adjustment: generation.cost_adjustment,
        }),
    ))
}

pub async fn list_itineraries(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<Vec<storage::itineraries::ItinerarySummary>>, ApiError> {
    let pool = require_pool(&state)?;
    Ok(Json(storage::itineraries::list_for_user(pool, &user_id).await?))
}

async fn owned_itinerary(pool: &PgPool, id: Uuid, user_id: &str) -> Result<Itinerary, ApiError> {
    let itinerary = storage::itineraries::get(pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if itinerary.user_id != user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(itinerary)
}

pub async fn get_itinerary(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
) -> Result<Json<Itinerary>, ApiError> {
    let pool = require_pool(&state)?;
    Ok(Json(owned_itinerary(pool, id, &user_id).await?))
}

pub async fn delete_itinerary(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let pool = require_pool(&state)?;
    owned_itinerary(pool, id, &user_id).await?;
    if !storage::itineraries::delete(pool, id).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!(itinerary_id = %id, %user_id, "itinerary deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn itinerary_advisories(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
) -> Result<Json<AdvisoryReport>, ApiError> {
    let pool = require_pool(&state)?;
    let weather = state
        .weather
        .as_ref()
        .ok_or(ApiError::Unavailable("weather provider"))?;
    let itinerary = owned_itinerary(pool, id, &user_id).await?;

    let report = advisory::check_itinerary(&itinerary, weather.as_ref())
        .await
        .map_err(|e| ApiError::BadGateway {
            error: "could not fetch weather",
            details: format!("{e:#}"),
        })?;
    Ok(Json(report))
}

pub async fn get_preferences(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<UserPreferences>, ApiError> {
    let pool = require_pool(&state)?;
    let prefs = storage::preferences::get(pool, &user_id)
        .await?
        .unwrap_or_default();
    Ok(Json(prefs))
}

pub async fn put_preferences(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(prefs): Json<UserPreferences>,
) -> Result<Json<UserPreferences>, ApiError> {
    let pool = require_pool(&state)?;
    storage::preferences::put(pool, &user_id, &prefs).await?;
    Ok(Json(prefs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<UserId, ApiError> {
        let (mut parts, _) = req.into_parts();
        UserId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn user_id_comes_from_proxy_header() {
        let req = Request::builder()
            .header(USER_ID_HEADER, " user-42 ")
            .body(())
            .unwrap();
        assert_eq!(extract(req).await.unwrap(), UserId("user-42".to_string()));
    }

    #[tokio::test]
    async fn missing_or_blank_user_id_is_unauthorized() {
        let req = Request::builder().body(()).unwrap();
        assert!(matches!(extract(req).await, Err(ApiError::Unauthorized)));

        let req = Request::builder()
            .header(USER_ID_HEADER, "   ")
            .body(())
            .unwrap();
        assert!(matches!(extract(req).await, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn degraded_state_returns_unavailable() {
        let state = AppState::degraded();
        let err = list_itineraries(State(state.clone()), UserId("u".into()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let Json(body) = health(State(state)).await;
        assert_eq!(body["database"], false);
        assert_eq!(body["generation"], false);
    }
}
