use crate::config::env_or;
use crate::domain::itinerary::{Itinerary, LocationSlot};
use crate::places::{GeoProvider, NotFound, PlaceDetails};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichOptions {
    /// Maximum lookups in flight at once.
    pub concurrency: usize,
    /// Leave locations that already carry coordinates and a place id alone.
    pub skip_enriched: bool,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            skip_enriched: true,
        }
    }
}

impl EnrichOptions {
    pub fn from_env() -> Self {
        Self {
            concurrency: env_or("ENRICH_CONCURRENCY", DEFAULT_CONCURRENCY).max(1),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedLocation {
    pub slot: LocationSlot,
    pub query: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    pub attempted: usize,
    pub resolved: usize,
    pub skipped: usize,
    pub unresolved: Vec<UnresolvedLocation>,
}

impl EnrichmentReport {
    pub fn is_degraded(&self) -> bool {
        !self.unresolved.is_empty()
    }
}

/// Resolves every activity, meal and accommodation location in place.
///
/// Lookups run concurrently up to `options.concurrency`; results are written
/// back by slot, so completion order does not matter. A failed lookup leaves
/// its location untouched and is listed in the report.
pub async fn enrich_itinerary(
    itinerary: &mut Itinerary,
    geo: &dyn GeoProvider,
    options: &EnrichOptions,
) -> EnrichmentReport {
    let mut report = EnrichmentReport::default();
    let mut jobs = Vec::new();

    for slot in itinerary.enrichable_slots() {
        let Some(location) = itinerary.location(slot) else {
            continue;
        };
        if options.skip_enriched && location.is_enriched() {
            report.skipped += 1;
            continue;
        }
        match location.lookup_query() {
            Some(query) => jobs.push((jobs.len(), slot, query.to_string())),
            None => report.unresolved.push(UnresolvedLocation {
                slot,
                query: String::new(),
                reason: "location has neither address nor name".to_string(),
            }),
        }
    }
    report.attempted = jobs.len();

    let mut results: Vec<(usize, LocationSlot, String, Result<PlaceDetails, NotFound>)> =
        stream::iter(jobs)
            .map(|(idx, slot, query)| async move {
                let res = geo.resolve(&query).await;
                (idx, slot, query, res)
            })
            .buffer_unordered(options.concurrency.max(1))
            .collect()
            .await;
    results.sort_by_key(|(idx, ..)| *idx);

    for (_, slot, query, res) in results {
        let outcome = res.and_then(|place| {
            if place.coordinates.is_unknown() {
                Err(NotFound::new(&query, "place has no coordinates"))
            } else {
                Ok(place)
            }
        });
        match outcome {
            Ok(place) => {
                if let Some(location) = itinerary.location_mut(slot) {
                    location.coordinates = place.coordinates;
                    location.place_id = Some(place.place_id);
                    report.resolved += 1;
                }
            }
            Err(not_found) => {
                tracing::warn!(
                    itinerary_id = %itinerary.id,
                    ?slot,
                    query = %not_found.query,
                    reason = %not_found.reason,
                    "location left unresolved"
                );
                report.unresolved.push(UnresolvedLocation {
                    slot,
                    query,
                    reason: not_found.reason,
                });
            }
        }
    }

    tracing::info!(
        itinerary_id = %itinerary.id,
        attempted = report.attempted,
        resolved = report.resolved,
        skipped = report.skipped,
        unresolved = report.unresolved.len(),
        "enrichment finished"
    );
    report
}
