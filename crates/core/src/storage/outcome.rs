use crate::domain::itinerary::Itinerary;
use crate::domain::trip::TripRequestStatus;
use crate::pipeline::{Generation, GenerationFailure};
use crate::storage::{itineraries, trip_requests};
use uuid::Uuid;

/// The writes that close out a generation attempt.
#[async_trait::async_trait]
pub trait GenerationLedger: Send + Sync {
    async fn save_itinerary(&self, itinerary: &Itinerary) -> anyhow::Result<()>;

    async fn mark(
        &self,
        request_id: Uuid,
        status: TripRequestStatus,
        error: Option<&str>,
        raw_llm_output: Option<&str>,
    ) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl GenerationLedger for sqlx::PgPool {
    async fn save_itinerary(&self, itinerary: &Itinerary) -> anyhow::Result<()> {
        itineraries::upsert(self, itinerary).await
    }

    async fn mark(
        &self,
        request_id: Uuid,
        status: TripRequestStatus,
        error: Option<&str>,
        raw_llm_output: Option<&str>,
    ) -> anyhow::Result<()> {
        trip_requests::set_status(self, request_id, status, error, raw_llm_output).await
    }
}

/// Records how a generation attempt ended for a request in `generating`.
///
/// A generated itinerary is stored and the request completed. When storing
/// fails the request is marked failed with the storage error before the
/// error is returned, so it never stays `generating`.
pub async fn record(
    ledger: &dyn GenerationLedger,
    request_id: Uuid,
    outcome: &Result<Generation, GenerationFailure>,
) -> anyhow::Result<()> {
    match outcome {
        Ok(generation) => {
            if let Err(err) = ledger.save_itinerary(&generation.itinerary).await {
                let detail = format!("failed to store itinerary: {err:#}");
                if let Err(mark_err) = ledger
                    .mark(
                        request_id,
                        TripRequestStatus::Failed,
                        Some(&detail),
                        Some(&generation.raw_output),
                    )
                    .await
                {
                    tracing::error!(
                        trip_request_id = %request_id,
                        error = %format!("{mark_err:#}"),
                        "could not mark trip request failed"
                    );
                }
                return Err(err);
            }
            ledger
                .mark(request_id, TripRequestStatus::Completed, None, None)
                .await
        }
        Err(failure) => {
            ledger
                .mark(
                    request_id,
                    TripRequestStatus::Failed,
                    Some(&failure.to_string()),
                    failure.raw_output(),
                )
                .await
        }
    }
}
