use anyhow::Context;
use std::path::Path;
use std::sync::Arc;

use wayfarer_core::config::Settings;
use wayfarer_core::domain::trip::{TripConstraints, TripRequestDraft, TripRequestStatus};
use wayfarer_core::llm::gemini::GeminiClient;
use wayfarer_core::pipeline::{EnrichOptions, GeneratorOptions, ItineraryGenerator};
use wayfarer_core::places::google::GoogleMapsClient;
use wayfarer_core::storage;

#[derive(Debug, Clone)]
pub struct GenerateArgs<'a> {
    pub request: &'a Path,
    pub user_id: &'a str,
    pub dry_run: bool,
    pub persist: bool,
    pub fail_on_unresolved: bool,
}

pub fn load_constraints(path: &Path, user_id: &str) -> anyhow::Result<TripConstraints> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trip request {}", path.display()))?;
    parse_constraints(&text, user_id)
}

fn parse_constraints(text: &str, user_id: &str) -> anyhow::Result<TripConstraints> {
    let draft: TripRequestDraft =
        serde_json::from_str(text).context("trip request is not valid JSON")?;
    Ok(draft.into_constraints(user_id)?)
}

pub async fn run(settings: &Settings, args: GenerateArgs<'_>) -> anyhow::Result<()> {
    let constraints = load_constraints(args.request, args.user_id)?;

    let generator = ItineraryGenerator::new(
        Arc::new(GeminiClient::from_settings(settings)?),
        Arc::new(GoogleMapsClient::from_settings(settings)?),
        GeneratorOptions {
            enrich: EnrichOptions::from_env(),
            fail_on_degraded_enrichment: args.fail_on_unresolved,
        },
    );

    if args.dry_run {
        let (prompt, duration_days) = generator.prompt_for(&constraints).await?;
        tracing::info!(
            trip_request_id = %constraints.id,
            duration_days,
            dry_run = true,
            "prompt built; skipping model call"
        );
        println!("{prompt}");
        return Ok(());
    }

    let pool = if args.persist {
        let db_url = settings.require_database_url()?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(db_url)
            .await
            .context("connect DATABASE_URL failed")?;
        storage::migrate(&pool).await?;
        storage::trip_requests::insert(&pool, &constraints).await?;
        storage::trip_requests::set_status(
            &pool,
            constraints.id,
            TripRequestStatus::Generating,
            None,
            None,
        )
        .await?;
        Some(pool)
    } else {
        None
    };

    let outcome = generator.generate(&constraints).await;
    if let Some(pool) = &pool {
        if let Err(e) = storage::outcome::record(pool, constraints.id, &outcome).await {
            if outcome.is_ok() {
                return Err(e);
            }
            tracing::error!(
                trip_request_id = %constraints.id,
                error = %format!("{e:#}"),
                "could not record generation failure"
            );
        }
    }

    match outcome {
        Ok(generation) => {
            if pool.is_some() {
                tracing::info!(
                    itinerary_id = %generation.itinerary.id,
                    "persisted itinerary"
                );
            }
            if generation.is_degraded() {
                tracing::warn!(
                    unresolved = generation.enrichment.unresolved.len(),
                    "some locations could not be resolved"
                );
            }
            println!("{}", serde_json::to_string_pretty(&generation.itinerary)?);
            Ok(())
        }
        Err(failure) => {
            let err = anyhow::anyhow!("itinerary generation failed: {failure}");
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(
                trip_request_id = %constraints.id,
                kind = failure.kind(),
                error = %failure,
                "itinerary generation failed"
            );
            Err(err)
        }
    }
}
