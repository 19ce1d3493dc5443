use crate::domain::itinerary::Coordinates;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NEARBY_RADIUS_M: u32 = 5_000;
pub const RESTAURANT_RADIUS_M: u32 = 2_000;
pub const RESTAURANT_LIMIT: usize = 10;
pub const ACCOMMODATION_RADIUS_M: u32 = 5_000;
pub const ACCOMMODATION_LIMIT: usize = 15;

/// A resolved place. Photo entries are fetchable URLs, not raw references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    pub rating: Option<f64>,
    pub price_level: Option<u8>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub opening_hours: Vec<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbySearch {
    pub center: Coordinates,
    pub radius_m: u32,
    pub place_type: Option<String>,
    pub keyword: Option<String>,
    pub limit: Option<usize>,
}

impl NearbySearch {
    pub fn around(center: Coordinates) -> Self {
        Self {
            center,
            radius_m: DEFAULT_NEARBY_RADIUS_M,
            place_type: None,
            keyword: None,
            limit: None,
        }
    }

    pub fn radius(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn place_type(mut self, place_type: impl Into<String>) -> Self {
        self.place_type = Some(place_type.into());
        self
    }

    pub fn keyword(mut self, keyword: Option<&str>) -> Self {
        self.keyword = keyword
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub start_address: String,
    pub end_address: String,
    pub distance_m: u64,
    pub duration_s: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    /// Visiting order of the intermediate waypoints after optimization.
    pub waypoint_order: Vec<usize>,
    pub legs: Vec<RouteLeg>,
    pub total_distance_m: u64,
    pub total_duration_s: u64,
    pub polyline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub status: String,
    pub distance_m: Option<u64>,
    pub duration_s: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    /// `rows[i][j]` is origin `i` to destination `j`.
    pub rows: Vec<Vec<MatrixCell>>,
}

impl DistanceMatrix {
    pub fn cell(&self, origin: usize, destination: usize) -> Option<&MatrixCell> {
        self.rows.get(origin)?.get(destination)
    }
}
