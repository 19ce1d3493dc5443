use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wayfarer_core::config::Settings;
use wayfarer_core::llm::gemini::GeminiClient;
use wayfarer_core::pipeline::{EnrichOptions, GeneratorOptions, ItineraryGenerator};
use wayfarer_core::places::google::GoogleMapsClient;
use wayfarer_core::weather::openweather::OpenWeatherClient;
use wayfarer_core::weather::WeatherProvider;

mod error;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match wayfarer_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let generator = match build_generator(&settings) {
        Ok(g) => Some(Arc::new(g)),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "itinerary generation disabled");
            None
        }
    };

    let weather: Option<Arc<dyn WeatherProvider>> = match OpenWeatherClient::from_settings(&settings)
    {
        Ok(c) => Some(Arc::new(c)),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "weather advisories disabled");
            None
        }
    };

    let state = AppState {
        pool,
        generator,
        weather,
    };

    let port: u16 = wayfarer_core::config::env_or("PORT", 3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_generator(settings: &Settings) -> anyhow::Result<ItineraryGenerator> {
    let llm = GeminiClient::from_settings(settings)?;
    let places = GoogleMapsClient::from_settings(settings)?;
    Ok(ItineraryGenerator::new(
        Arc::new(llm),
        Arc::new(places),
        GeneratorOptions {
            enrich: EnrichOptions::from_env(),
            fail_on_degraded_enrichment: false,
        },
    ))
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/health", get(routes::health))
        .route(
            "/itineraries",
            post(routes::create_itinerary).get(routes::list_itineraries),
        )
        .route(
            "/itineraries/:id",
            get(routes::get_itinerary).delete(routes::delete_itinerary),
        )
        .route(
            "/itineraries/:id/advisories",
            get(routes::itinerary_advisories),
        )
        .route(
            "/users/me/preferences",
            get(routes::get_preferences).put(routes::put_preferences),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[derive(Clone)]
pub struct AppState {
    pool: Option<PgPool>,
    generator: Option<Arc<ItineraryGenerator>>,
    weather: Option<Arc<dyn WeatherProvider>>,
}

#[cfg(test)]
impl AppState {
    fn degraded() -> Self {
        Self {
            pool: None,
            generator: None,
            weather: None,
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
