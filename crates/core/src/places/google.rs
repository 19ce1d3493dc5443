use crate::config::{env_or, Settings};
use crate::domain::itinerary::Coordinates;
use crate::places::types::{MatrixCell, RouteLeg};
use crate::places::{
    DistanceMatrix, GeoProvider, NearbySearch, NotFound, PlaceDetails, PlaceSearch, RouteSummary,
};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const PHOTO_MAX_WIDTH: u32 = 400;

const RESOLVE_DETAIL_FIELDS: &str = "name,formatted_address,geometry,rating,price_level,photos,opening_hours,website,formatted_phone_number";
const DESTINATION_FIELDS: &str = "place_id,name,geometry,formatted_address,rating,photos";

/// Google Maps Platform web services (Places, Directions, Distance Matrix).
#[derive(Debug, Clone)]
pub struct GoogleMapsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleMapsClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_google_maps_api_key()?.to_string();
        let base_url = std::env::var("GOOGLE_MAPS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = env_or("GOOGLE_MAPS_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        Self::new(api_key, base_url, timeout_secs)
    }

    pub fn new(api_key: String, base_url: String, timeout_secs: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> anyhow::Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Google Maps request failed: {path}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("failed to read Google Maps response body")?;
        if !status.is_success() {
            anyhow::bail!("Google Maps HTTP error: path={path} status={status} body={text}");
        }

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("failed to decode Google Maps response: path={path}"))
    }

    fn photo_url(&self, reference: &str) -> String {
        format!(
            "{}/maps/api/place/photo?maxwidth={PHOTO_MAX_WIDTH}&photoreference={reference}&key={}",
            self.base_url, self.api_key
        )
    }

    fn to_details(&self, place: WirePlace, place_id: String) -> PlaceDetails {
        let coordinates = place
            .geometry
            .map(|g| Coordinates::new(g.location.lat, g.location.lng))
            .unwrap_or(Coordinates::UNKNOWN);
        PlaceDetails {
            place_id,
            name: place.name.unwrap_or_default(),
            address: place
                .formatted_address
                .or(place.vicinity)
                .unwrap_or_default(),
            coordinates,
            rating: place.rating,
            price_level: place.price_level,
            photos: place
                .photos
                .iter()
                .map(|p| self.photo_url(&p.photo_reference))
                .collect(),
            opening_hours: place.opening_hours.map(|o| o.weekday_text).unwrap_or_default(),
            website: place.website,
            phone_number: place.formatted_phone_number,
        }
    }

    async fn find_place(&self, query: &str, fields: &str) -> anyhow::Result<Option<WirePlace>> {
        let res: FindPlaceResponse = self
            .get_json(
                "/maps/api/place/findplacefromtext/json",
                &[
                    ("input", query.to_string()),
                    ("inputtype", "textquery".to_string()),
                    ("fields", fields.to_string()),
                ],
            )
            .await?;
        if !api_status_ok(&res.status, res.error_message.as_deref())? {
            return Ok(None);
        }
        Ok(res.candidates.into_iter().next())
    }

    async fn try_resolve(&self, query: &str) -> Result<PlaceDetails, String> {
        let candidate = self
            .find_place(query, "place_id")
            .await
            .map_err(|e| format!("{e:#}"))?
            .ok_or_else(|| "no candidates".to_string())?;
        let place_id = candidate
            .place_id
            .ok_or_else(|| "candidate has no place_id".to_string())?;

        let res: DetailsResponse = self
            .get_json(
                "/maps/api/place/details/json",
                &[
                    ("place_id", place_id.clone()),
                    ("fields", RESOLVE_DETAIL_FIELDS.to_string()),
                ],
            )
            .await
            .map_err(|e| format!("{e:#}"))?;
        if !api_status_ok(&res.status, res.error_message.as_deref()).map_err(|e| format!("{e:#}"))? {
            return Err("place details returned no result".to_string());
        }
        let place = res
            .result
            .ok_or_else(|| "place details returned no result".to_string())?;
        Ok(self.to_details(place, place_id))
    }
}

/// `Ok(true)` for `OK`, `Ok(false)` for `ZERO_RESULTS`, an error otherwise.
fn api_status_ok(status: &str, error_message: Option<&str>) -> anyhow::Result<bool> {
    match status {
        "OK" => Ok(true),
        "ZERO_RESULTS" => Ok(false),
        other => anyhow::bail!(
            "Google Maps API status={other}: {}",
            error_message.unwrap_or("no error message")
        ),
    }
}

fn join_coordinates(points: &[Coordinates]) -> String {
    points
        .iter()
        .map(Coordinates::to_query)
        .collect::<Vec<_>>()
        .join("|")
}

#[async_trait::async_trait]
impl GeoProvider for GoogleMapsClient {
    async fn resolve(&self, query: &str) -> Result<PlaceDetails, NotFound> {
        let query = query.trim();
        if query.is_empty() {
            return Err(NotFound::new(query, "empty query"));
        }
        self.try_resolve(query).await.map_err(|reason| {
            tracing::debug!(query, %reason, "place lookup failed");
            NotFound::new(query, reason)
        })
    }

    async fn destination_info(&self, query: &str) -> Option<PlaceDetails> {
        match self.find_place(query, DESTINATION_FIELDS).await {
            Ok(Some(place)) => {
                let place_id = place.place_id.clone()?;
                Some(self.to_details(place, place_id))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(query, error = %format!("{e:#}"), "destination lookup failed");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl PlaceSearch for GoogleMapsClient {
    async fn nearby(&self, search: NearbySearch) -> anyhow::Result<Vec<PlaceDetails>> {
        let mut query = vec![
            ("location", search.center.to_query()),
            ("radius", search.radius_m.to_string()),
        ];
        if let Some(t) = &search.place_type {
            query.push(("type", t.clone()));
        }
        if let Some(k) = &search.keyword {
            query.push(("keyword", k.clone()));
        }

        let res: NearbyResponse = self
            .get_json("/maps/api/place/nearbysearch/json", &query)
            .await?;
        if !api_status_ok(&res.status, res.error_message.as_deref())? {
            return Ok(Vec::new());
        }

        let limit = search.limit.unwrap_or(usize::MAX);
        Ok(res
            .results
            .into_iter()
            .filter_map(|p| {
                let id = p.place_id.clone()?;
                Some(self.to_details(p, id))
            })
            .take(limit)
            .collect())
    }

    async fn route(&self, waypoints: &[Coordinates]) -> anyhow::Result<Option<RouteSummary>> {
        let [origin, middle @ .., destination] = waypoints else {
            return Ok(None);
        };

        let mut query = vec![
            ("origin", origin.to_query()),
            ("destination", destination.to_query()),
        ];
        if !middle.is_empty() {
            query.push(("waypoints", format!("optimize:true|{}", join_coordinates(middle))));
        }

        let res: DirectionsResponse = self.get_json("/maps/api/directions/json", &query).await?;
        if !api_status_ok(&res.status, res.error_message.as_deref())? {
            return Ok(None);
        }
        let Some(route) = res.routes.into_iter().next() else {
            return Ok(None);
        };

        let legs: Vec<RouteLeg> = route
            .legs
            .into_iter()
            .map(|l| RouteLeg {
                start_address: l.start_address,
                end_address: l.end_address,
                distance_m: l.distance.map_or(0, |d| d.value),
                duration_s: l.duration.map_or(0, |d| d.value),
            })
            .collect();

        Ok(Some(RouteSummary {
            waypoint_order: route.waypoint_order,
            total_distance_m: legs.iter().map(|l| l.distance_m).sum(),
            total_duration_s: legs.iter().map(|l| l.duration_s).sum(),
            legs,
            polyline: route.overview_polyline.map(|p| p.points),
        }))
    }

    async fn distance_matrix(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
    ) -> anyhow::Result<DistanceMatrix> {
        if origins.is_empty() || destinations.is_empty() {
            anyhow::bail!("distance matrix needs at least one origin and one destination");
        }

        let res: DistanceMatrixResponse = self
            .get_json(
                "/maps/api/distancematrix/json",
                &[
                    ("origins", join_coordinates(origins)),
                    ("destinations", join_coordinates(destinations)),
                    ("units", "metric".to_string()),
                ],
            )
            .await?;
        api_status_ok(&res.status, res.error_message.as_deref())?;

        Ok(DistanceMatrix {
            origins: res.origin_addresses,
            destinations: res.destination_addresses,
            rows: res
                .rows
                .into_iter()
                .map(|row| {
                    row.elements
                        .into_iter()
                        .map(|e| MatrixCell {
                            status: e.status,
                            distance_m: e.distance.map(|d| d.value),
                            duration_s: e.duration.map(|d| d.value),
                        })
                        .collect()
                })
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct FindPlaceResponse {
    status: String,
    #[serde(default)]
    candidates: Vec<WirePlace>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<WirePlace>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    results: Vec<WirePlace>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WirePlace {
    place_id: Option<String>,
    name: Option<String>,
    formatted_address: Option<String>,
    vicinity: Option<String>,
    geometry: Option<Geometry>,
    rating: Option<f64>,
    price_level: Option<u8>,
    photos: Vec<Photo>,
    opening_hours: Option<OpeningHours>,
    website: Option<String>,
    formatted_phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct Photo {
    photo_reference: String,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    #[serde(default)]
    weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<WireRoute>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireRoute {
    #[serde(default)]
    legs: Vec<WireLeg>,
    #[serde(default)]
    waypoint_order: Vec<usize>,
    #[serde(default)]
    overview_polyline: Option<Polyline>,
}

#[derive(Debug, Deserialize)]
struct WireLeg {
    #[serde(default)]
    start_address: String,
    #[serde(default)]
    end_address: String,
    #[serde(default)]
    distance: Option<Measure>,
    #[serde(default)]
    duration: Option<Measure>,
}

#[derive(Debug, Deserialize)]
struct Measure {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct Polyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    origin_addresses: Vec<String>,
    #[serde(default)]
    destination_addresses: Vec<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    #[serde(default)]
    distance: Option<Measure>,
    #[serde(default)]
    duration: Option<Measure>,
}
