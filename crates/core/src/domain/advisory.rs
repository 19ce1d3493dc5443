use crate::domain::itinerary::Location;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One day's weather, in metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub location: String,
    pub date: NaiveDate,
    /// Provider's coarse condition label, e.g. `Rain` or `Clear`.
    pub condition: String,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub precipitation_mm: f64,
    pub humidity_pct: f64,
    pub wind_speed_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAdvisory {
    pub day: u32,
    pub date: NaiveDate,
    pub impact: Impact,
    pub title: String,
    pub description: String,
    pub suggested_actions: Vec<String>,
    pub affected_activity_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndoorAlternative {
    pub original_activity_id: Uuid,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub cost: f64,
    pub duration_hours: f64,
}
