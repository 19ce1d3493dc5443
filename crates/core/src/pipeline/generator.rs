use crate::domain::contract::{CostAdjustment, DayCountMismatch};
use crate::domain::itinerary::Itinerary;
use crate::domain::trip::{TripConstraints, TripValidationError};
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::json::{self, ParseFailure};
use crate::llm::{prompt, LlmClient, Provider};
use crate::pipeline::enrich::{enrich_itinerary, EnrichOptions, EnrichmentReport};
use crate::places::GeoProvider;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    pub enrich: EnrichOptions,
    /// Turn a partially unresolved itinerary into a failure instead of a flag.
    pub fail_on_degraded_enrichment: bool,
}

/// A generated, parsed and enriched itinerary plus what happened on the way.
#[derive(Debug, Clone)]
pub struct Generation {
    pub itinerary: Itinerary,
    pub enrichment: EnrichmentReport,
    pub day_count_mismatch: Option<DayCountMismatch>,
    pub cost_adjustment: Option<CostAdjustment>,
    pub raw_output: String,
}

impl Generation {
    pub fn is_degraded(&self) -> bool {
        self.enrichment.is_degraded()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationFailure {
    #[error("invalid trip constraints: {0}")]
    InvalidConstraints(#[from] TripValidationError),

    #[error("prompt provider {} failed: {detail}", .provider.as_str())]
    PromptProvider {
        provider: Provider,
        detail: String,
        raw_output: Option<String>,
    },

    #[error("malformed itinerary payload: {detail}")]
    MalformedPayload { detail: String, raw_output: String },

    #[error(
        "enrichment degraded: {} of {} locations unresolved",
        .generation.enrichment.unresolved.len(),
        .generation.enrichment.attempted
    )]
    EnrichmentDegraded { generation: Box<Generation> },
}

impl GenerationFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConstraints(_) => "invalid_constraints",
            Self::PromptProvider { .. } => "prompt_provider",
            Self::MalformedPayload { .. } => "malformed_payload",
            Self::EnrichmentDegraded { .. } => "enrichment_degraded",
        }
    }

    /// Model output worth keeping on a failure record, when there is any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Self::InvalidConstraints(_) => None,
            Self::PromptProvider { raw_output, .. } => raw_output.as_deref(),
            Self::MalformedPayload { raw_output, .. } => Some(raw_output),
            Self::EnrichmentDegraded { generation } => Some(&generation.raw_output),
        }
    }

    fn from_provider(provider: Provider, err: anyhow::Error) -> Self {
        let raw_output = err
            .downcast_ref::<LlmDiagnosticsError>()
            .and_then(|d| d.raw_output.clone());
        Self::PromptProvider {
            provider,
            detail: format!("{err:#}"),
            raw_output,
        }
    }
}

impl From<ParseFailure> for GenerationFailure {
    fn from(err: ParseFailure) -> Self {
        match err {
            ParseFailure::MalformedPayload { detail, raw_output } => {
                Self::MalformedPayload { detail, raw_output }
            }
        }
    }
}

/// Turns trip constraints into an enriched itinerary: destination lookup,
/// prompt, one model call, parse, enrich. Nothing is persisted here.
#[derive(Clone)]
pub struct ItineraryGenerator {
    llm: Arc<dyn LlmClient>,
    places: Arc<dyn GeoProvider>,
    options: GeneratorOptions,
}

impl ItineraryGenerator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        places: Arc<dyn GeoProvider>,
        options: GeneratorOptions,
    ) -> Self {
        Self {
            llm,
            places,
            options,
        }
    }

    /// Builds the prompt `generate` would send, including the destination lookup.
    pub async fn prompt_for(
        &self,
        constraints: &TripConstraints,
    ) -> Result<(String, u32), GenerationFailure> {
        constraints.validate()?;
        let duration_days = constraints.duration_days()?;

        let destination = self.places.destination_info(&constraints.destination).await;
        if destination.is_none() {
            tracing::info!(
                trip_request_id = %constraints.id,
                destination = %constraints.destination,
                "no destination context; prompting without it"
            );
        }

        let prompt = prompt::build_itinerary_prompt(constraints, duration_days, destination.as_ref());
        Ok((prompt, duration_days))
    }

    pub async fn generate(
        &self,
        constraints: &TripConstraints,
    ) -> Result<Generation, GenerationFailure> {
        let (prompt, duration_days) = self.prompt_for(constraints).await?;

        let provider = self.llm.provider();
        tracing::info!(
            trip_request_id = %constraints.id,
            provider = provider.as_str(),
            duration_days,
            "requesting itinerary"
        );
        let raw_output = self
            .llm
            .generate_text(&prompt)
            .await
            .map_err(|e| GenerationFailure::from_provider(provider, e))?;

        let parsed = json::parse_itinerary(&raw_output, constraints, duration_days)?;
        let mut itinerary = parsed.itinerary;

        let enrichment =
            enrich_itinerary(&mut itinerary, self.places.as_ref(), &self.options.enrich).await;

        let generation = Generation {
            itinerary,
            enrichment,
            day_count_mismatch: parsed.day_count_mismatch,
            cost_adjustment: parsed.cost_adjustment,
            raw_output,
        };

        if generation.is_degraded() {
            tracing::warn!(
                trip_request_id = %constraints.id,
                unresolved = generation.enrichment.unresolved.len(),
                "itinerary has unresolved locations"
            );
            if self.options.fail_on_degraded_enrichment {
                return Err(GenerationFailure::EnrichmentDegraded {
                    generation: Box::new(generation),
                });
            }
        }

        tracing::info!(
            trip_request_id = %constraints.id,
            itinerary_id = %generation.itinerary.id,
            days = generation.itinerary.days.len(),
            "itinerary generated"
        );
        Ok(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::itinerary::Coordinates;
    use crate::domain::trip::TripRequestDraft;
    use crate::llm::error::FailureStage;
    use crate::pipeline::enrich::tests::TableGeo;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedLlm {
        reply: anyhow::Result<String>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: anyhow::Error) -> Self {
            Self {
                reply: Err(err),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedLlm {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn generate_text(&self, prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow::anyhow!("{e:#}")),
            }
        }
    }

    fn constraints() -> TripConstraints {
        serde_json::from_value::<TripRequestDraft>(json!({
            "destination": "Jaipur",
            "start_date": "2026-03-01",
            "end_date": "2026-03-02",
            "budget": {"min": 10000.0, "max": 30000.0},
            "interests": ["heritage"],
        }))
        .unwrap()
        .into_constraints("user-1")
        .unwrap()
    }

    fn model_reply(unknown_place: bool) -> String {
        let address = if unknown_place { "Nowhere Lane" } else { "Devisinghpura, Amer" };
        let body = json!({
            "overview": "Forts and food",
            "days": [
                {"day": 1, "activities": [{"name": "Amber Fort", "category": "heritage",
                    "location": {"name": "Amber Fort", "address": address}, "cost": 500}]},
                {"day": 2, "meals": [{"type": "dinner", "restaurant": "LMB",
                    "location": {"name": "LMB", "address": "Johari Bazaar"}, "estimatedCost": 400}]}
            ],
            "costBreakdown": {"accommodation": 0, "transport": 0, "activities": 500,
                "meals": 400, "miscellaneous": 100, "total": 1000}
        });
        format!("Here you go:\n```json\n{body}\n```")
    }

    fn geo() -> Arc<TableGeo> {
        Arc::new(TableGeo::with(&[
            ("Jaipur", 26.91, 75.79),
            ("Devisinghpura, Amer", 26.98, 75.85),
            ("Johari Bazaar", 26.91, 75.82),
        ]))
    }

    #[tokio::test]
    async fn generates_parses_and_enriches() {
        let llm = Arc::new(ScriptedLlm::replying(&model_reply(false)));
        let generator = ItineraryGenerator::new(llm.clone(), geo(), GeneratorOptions::default());
        let c = constraints();

        let g = generator.generate(&c).await.unwrap();
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert!(!g.is_degraded());
        assert_eq!(g.itinerary.version, 1);
        assert_eq!(g.itinerary.trip_request_id, c.id);
        assert_eq!(g.itinerary.days.len(), 2);
        assert_eq!(g.itinerary.cost_breakdown.total, 1000.0);
        assert_eq!(
            g.itinerary.days[0].activities[0].location.coordinates,
            Coordinates::new(26.98, 75.85)
        );
        assert!(g.raw_output.contains("Forts and food"));

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("DESTINATION CONTEXT"));
        assert!(prompts[0].contains("2-day itinerary for Jaipur"));
    }

    #[tokio::test]
    async fn unresolved_location_is_flagged_not_fatal() {
        let llm = Arc::new(ScriptedLlm::replying(&model_reply(true)));
        let generator = ItineraryGenerator::new(llm, geo(), GeneratorOptions::default());
        let g = generator.generate(&constraints()).await.unwrap();
        assert!(g.is_degraded());
        assert_eq!(
            g.itinerary.days[0].activities[0].location.coordinates,
            Coordinates::UNKNOWN
        );
    }

    #[tokio::test]
    async fn degraded_enrichment_fails_when_configured() {
        let llm = Arc::new(ScriptedLlm::replying(&model_reply(true)));
        let options = GeneratorOptions {
            fail_on_degraded_enrichment: true,
            ..GeneratorOptions::default()
        };
        let generator = ItineraryGenerator::new(llm, geo(), options);
        let err = generator.generate(&constraints()).await.unwrap_err();
        assert_eq!(err.kind(), "enrichment_degraded");
        match err {
            GenerationFailure::EnrichmentDegraded { generation } => {
                assert_eq!(generation.enrichment.unresolved.len(), 1);
            }
            other => panic!("unexpected failure: {other}"),
        }
    }

    #[tokio::test]
    async fn non_json_reply_is_malformed_with_raw_output() {
        let llm = Arc::new(ScriptedLlm::replying("Sorry, I cannot plan that trip."));
        let generator = ItineraryGenerator::new(llm, geo(), GeneratorOptions::default());
        let err = generator.generate(&constraints()).await.unwrap_err();
        assert!(matches!(err, GenerationFailure::MalformedPayload { .. }));
        assert_eq!(err.raw_output(), Some("Sorry, I cannot plan that trip."));
    }

    #[tokio::test]
    async fn provider_error_keeps_diagnostics() {
        let diag = LlmDiagnosticsError::new(Provider::Gemini, FailureStage::Http, "status=503")
            .with_body("upstream overloaded".to_string());
        let llm = Arc::new(ScriptedLlm::failing(diag.clone().into()));
        let generator = ItineraryGenerator::new(llm, geo(), GeneratorOptions::default());
        let err = generator.generate(&constraints()).await.unwrap_err();
        assert_eq!(err.kind(), "prompt_provider");
        assert!(err.to_string().contains("status=503"));

        let direct = GenerationFailure::from_provider(Provider::Gemini, diag.into());
        assert_eq!(direct.raw_output(), Some("upstream overloaded"));
    }

    #[tokio::test]
    async fn invalid_constraints_never_reach_the_model() {
        let llm = Arc::new(ScriptedLlm::replying(&model_reply(false)));
        let generator = ItineraryGenerator::new(llm.clone(), geo(), GeneratorOptions::default());
        let mut c = constraints();
        std::mem::swap(&mut c.start_date, &mut c.end_date);

        let err = generator.generate(&c).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationFailure::InvalidConstraints(TripValidationError::EndBeforeStart { .. })
        ));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }
}
