pub mod enrich;
pub mod generator;

pub use enrich::{enrich_itinerary, EnrichOptions, EnrichmentReport, UnresolvedLocation};
pub use generator::{Generation, GenerationFailure, GeneratorOptions, ItineraryGenerator};
