pub mod openweather;

use crate::domain::advisory::WeatherObservation;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One forecast interval (three hours for OpenWeather), metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSlot {
    pub at: DateTime<Utc>,
    pub condition: String,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_ms: f64,
    pub rain_mm: f64,
    /// Offset of the forecast location from UTC, in seconds.
    #[serde(default)]
    pub utc_offset_s: i32,
}

impl ForecastSlot {
    /// Calendar date at the forecast location.
    pub fn local_date(&self) -> NaiveDate {
        match FixedOffset::east_opt(self.utc_offset_s) {
            Some(tz) => self.at.with_timezone(&tz).date_naive(),
            None => self.at.date_naive(),
        }
    }
}

#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Upcoming forecast slots for a free-text location, oldest first.
    async fn forecast(&self, location: &str) -> anyhow::Result<Vec<ForecastSlot>>;
}

/// Folds the slots falling on `date`, local to the destination, into one observation.
/// `None` when the forecast does not cover that date.
pub fn daily_observation(
    location: &str,
    slots: &[ForecastSlot],
    date: NaiveDate,
) -> Option<WeatherObservation> {
    let day: Vec<&ForecastSlot> = slots
        .iter()
        .filter(|s| s.local_date() == date)
        .collect();
    let first = day.first()?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for s in &day {
        *counts.entry(s.condition.as_str()).or_default() += 1;
    }
    // Ties go to the condition seen first that day.
    let condition = day
        .iter()
        .map(|s| s.condition.as_str())
        .fold(first.condition.as_str(), |best, c| {
            if counts[c] > counts[best] {
                c
            } else {
                best
            }
        });

    Some(WeatherObservation {
        location: location.to_string(),
        date,
        condition: condition.to_string(),
        temp_min_c: day.iter().map(|s| s.temp_min_c).fold(f64::INFINITY, f64::min),
        temp_max_c: day
            .iter()
            .map(|s| s.temp_max_c)
            .fold(f64::NEG_INFINITY, f64::max),
        precipitation_mm: day.iter().map(|s| s.rain_mm).sum(),
        humidity_pct: day.iter().map(|s| s.humidity_pct).sum::<f64>() / day.len() as f64,
        wind_speed_ms: day.iter().map(|s| s.wind_speed_ms).fold(0.0, f64::max),
    })
}
