pub mod google;
pub mod types;

pub use types::{DistanceMatrix, NearbySearch, PlaceDetails, RouteSummary};

use crate::domain::itinerary::Coordinates;
use types::{ACCOMMODATION_LIMIT, ACCOMMODATION_RADIUS_M, RESTAURANT_LIMIT, RESTAURANT_RADIUS_M};

/// A lookup that produced no usable place. Contained at the location boundary:
/// the caller keeps its unresolved location.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("no place found for {query:?}: {reason}")]
pub struct NotFound {
    pub query: String,
    pub reason: String,
}

impl NotFound {
    pub fn new(query: &str, reason: impl Into<String>) -> Self {
        Self {
            query: query.to_string(),
            reason: reason.into(),
        }
    }
}

/// Resolves free-text place queries to coordinates and details.
#[async_trait::async_trait]
pub trait GeoProvider: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<PlaceDetails, NotFound>;

    /// Best-effort context for a whole destination. `None` on any failure.
    async fn destination_info(&self, query: &str) -> Option<PlaceDetails> {
        self.resolve(query).await.ok()
    }
}

/// Read-only place search and routing around already-resolved coordinates.
#[async_trait::async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn nearby(&self, search: NearbySearch) -> anyhow::Result<Vec<PlaceDetails>>;

    async fn search_restaurants(
        &self,
        center: Coordinates,
        cuisine: Option<&str>,
    ) -> anyhow::Result<Vec<PlaceDetails>> {
        self.nearby(
            NearbySearch::around(center)
                .radius(RESTAURANT_RADIUS_M)
                .place_type("restaurant")
                .keyword(cuisine)
                .limit(RESTAURANT_LIMIT),
        )
        .await
    }

    async fn search_accommodations(
        &self,
        center: Coordinates,
        keyword: Option<&str>,
    ) -> anyhow::Result<Vec<PlaceDetails>> {
        self.nearby(
            NearbySearch::around(center)
                .radius(ACCOMMODATION_RADIUS_M)
                .place_type("lodging")
                .keyword(keyword)
                .limit(ACCOMMODATION_LIMIT),
        )
        .await
    }

    /// Route through `waypoints` in order, letting the provider reorder the
    /// intermediate ones. `None` for fewer than two points or no route.
    async fn route(&self, waypoints: &[Coordinates]) -> anyhow::Result<Option<RouteSummary>>;

    async fn distance_matrix(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
    ) -> anyhow::Result<DistanceMatrix>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSearch {
        seen: Mutex<Vec<NearbySearch>>,
    }

    #[async_trait::async_trait]
    impl PlaceSearch for RecordingSearch {
        async fn nearby(&self, search: NearbySearch) -> anyhow::Result<Vec<PlaceDetails>> {
            self.seen.lock().unwrap().push(search);
            Ok(Vec::new())
        }

        async fn route(&self, _: &[Coordinates]) -> anyhow::Result<Option<RouteSummary>> {
            Ok(None)
        }

        async fn distance_matrix(
            &self,
            _: &[Coordinates],
            _: &[Coordinates],
        ) -> anyhow::Result<DistanceMatrix> {
            anyhow::bail!("unused")
        }
    }

    #[tokio::test]
    async fn restaurant_and_lodging_searches_use_fixed_parameters() {
        let search = RecordingSearch::default();
        let center = Coordinates::new(26.9, 75.8);
        search.search_restaurants(center, Some("  ")).await.unwrap();
        search
            .search_accommodations(center, Some("boutique"))
            .await
            .unwrap();

        let seen = search.seen.lock().unwrap();
        assert_eq!(seen[0].radius_m, 2_000);
        assert_eq!(seen[0].place_type.as_deref(), Some("restaurant"));
        assert_eq!(seen[0].keyword, None);
        assert_eq!(seen[0].limit, Some(10));
        assert_eq!(seen[1].radius_m, 5_000);
        assert_eq!(seen[1].place_type.as_deref(), Some("lodging"));
        assert_eq!(seen[1].keyword.as_deref(), Some("boutique"));
        assert_eq!(seen[1].limit, Some(15));
    }
}
