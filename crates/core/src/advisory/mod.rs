use crate::domain::advisory::{Impact, IndoorAlternative, WeatherAdvisory, WeatherObservation};
use crate::domain::itinerary::{DayPlan, Itinerary};
use crate::weather::{daily_observation, WeatherProvider};
use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const HEAVY_RAIN_MM: f64 = 5.0;
pub const LIGHT_RAIN_MM: f64 = 1.0;
pub const HOT_MAX_C: f64 = 40.0;
pub const COLD_MIN_C: f64 = 5.0;

const HEAT_ACTIONS: &[&str] = &[
    "Stay hydrated",
    "Avoid outdoor activities during peak hours (12-4 PM)",
    "Wear sun protection",
];
const COLD_ACTIONS: &[&str] = &["Wear warm clothing", "Check if venues have heating"];

/// Share of the original activity's cost assumed for its indoor replacement.
const INDOOR_COST_FACTOR: f64 = 0.8;

/// Weather advisory for one day, or `None` when no rule fires or the day has
/// nothing outdoors. Rain and temperature are separate factors; the stronger
/// one sets the impact and the first matching one sets the title.
pub fn evaluate(day: &DayPlan, weather: &WeatherObservation) -> Option<WeatherAdvisory> {
    let affected: Vec<_> = day.outdoor_activities().map(|a| a.id).collect();
    if affected.is_empty() {
        return None;
    }

    let mut impact = Impact::Low;
    let mut headline: Option<(String, String)> = None;
    let mut actions: Vec<String> = Vec::new();

    let rain = weather.precipitation_mm;
    if rain > HEAVY_RAIN_MM {
        impact = Impact::High;
        headline = Some((
            format!("Heavy Rain Expected on Day {}", day.day),
            format!(
                "Heavy rainfall ({rain:.1}mm) expected in {}. This may affect outdoor activities.",
                weather.location
            ),
        ));
        actions.extend(
            [
                "Consider indoor alternatives",
                "Bring rain gear if proceeding with outdoor activities",
                "Check if activities offer covered areas",
            ]
            .map(String::from),
        );
    } else if rain > LIGHT_RAIN_MM {
        impact = Impact::Medium;
        headline = Some((
            format!("Light Rain Expected on Day {}", day.day),
            format!(
                "Light rain expected in {}. Outdoor activities may be affected.",
                weather.location
            ),
        ));
        actions.push("Bring umbrella or light rain jacket".to_string());
    }

    let temperature = if weather.temp_max_c > HOT_MAX_C {
        Some((
            format!("High Temperature Alert - Day {}", day.day),
            format!(
                "Very hot weather expected ({:.1}°C). Take precautions for outdoor activities.",
                weather.temp_max_c
            ),
            HEAT_ACTIONS,
        ))
    } else if weather.temp_min_c < COLD_MIN_C {
        Some((
            format!("Cold Weather Alert - Day {}", day.day),
            format!(
                "Cold weather expected ({:.1}°C). Dress warmly for outdoor activities.",
                weather.temp_min_c
            ),
            COLD_ACTIONS,
        ))
    } else {
        None
    };

    if let Some((title, description, temp_actions)) = temperature {
        impact = impact.max(Impact::Medium);
        if headline.is_none() {
            headline = Some((title, description));
        }
        actions.extend(temp_actions.iter().map(|s| s.to_string()));
    }

    let (title, description) = headline?;
    Some(WeatherAdvisory {
        day: day.day,
        date: day.date,
        impact,
        title,
        description,
        suggested_actions: actions,
        affected_activity_ids: affected,
    })
}

/// General packing and planning tips for a provider condition label.
pub fn condition_tips(condition: &str) -> Vec<&'static str> {
    match condition.trim().to_ascii_lowercase().as_str() {
        "rain" => vec!["Carry umbrella or raincoat", "Wear waterproof shoes"],
        "snow" => vec!["Dress warmly in layers", "Wear non-slip footwear"],
        "clear" => vec![
            "Perfect weather for outdoor activities",
            "Don't forget sunscreen",
        ],
        "clouds" => vec!["Good weather for sightseeing"],
        _ => Vec::new(),
    }
}

/// Indoor stand-ins for the activities a high-impact advisory affects.
pub fn indoor_alternatives(
    itinerary: &Itinerary,
    advisory: &WeatherAdvisory,
) -> Vec<IndoorAlternative> {
    if advisory.impact != Impact::High {
        return Vec::new();
    }
    advisory
        .affected_activity_ids
        .iter()
        .filter_map(|id| itinerary.find_activity(*id))
        .map(|a| IndoorAlternative {
            original_activity_id: a.id,
            name: format!("Indoor alternative to {}", a.name),
            description: "Museum or cultural center visit".to_string(),
            location: a.location.clone(),
            cost: a.cost * INDOOR_COST_FACTOR,
            duration_hours: a.duration_hours,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayForecast {
    pub day: u32,
    pub observation: WeatherObservation,
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvisoryReport {
    pub advisories: Vec<WeatherAdvisory>,
    pub indoor_alternatives: Vec<IndoorAlternative>,
    pub forecasts: Vec<DayForecast>,
    /// Days with activities that fall outside the forecast window.
    pub uncovered_days: Vec<u32>,
}

/// Fetches the destination forecast once and evaluates every day that has activities.
pub async fn check_itinerary(
    itinerary: &Itinerary,
    weather: &dyn WeatherProvider,
) -> anyhow::Result<AdvisoryReport> {
    let slots = weather
        .forecast(&itinerary.destination)
        .await
        .with_context(|| format!("failed to fetch forecast for {}", itinerary.destination))?;

    let mut report = AdvisoryReport::default();
    for day in itinerary.days.iter().filter(|d| !d.activities.is_empty()) {
        let Some(observation) = daily_observation(&itinerary.destination, &slots, day.date) else {
            report.uncovered_days.push(day.day);
            continue;
        };

        if let Some(advisory) = evaluate(day, &observation) {
            report
                .indoor_alternatives
                .extend(indoor_alternatives(itinerary, &advisory));
            report.advisories.push(advisory);
        }
        report.forecasts.push(DayForecast {
            day: day.day,
            tips: condition_tips(&observation.condition)
                .into_iter()
                .map(String::from)
                .collect(),
            observation,
        });
    }

    tracing::info!(
        itinerary_id = %itinerary.id,
        advisories = report.advisories.len(),
        uncovered = report.uncovered_days.len(),
        "weather check finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::itinerary::{Activity, CostBreakdown, Location};
    use crate::domain::trip::TravelInterest;
    use crate::weather::ForecastSlot;
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    fn activity(name: &str, category: Option<TravelInterest>) -> Activity {
        Activity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            category,
            location: Location::unresolved(name, "Munnar"),
            duration_hours: 3.0,
            cost: 1000.0,
            rating: None,
            opening_hours: None,
            best_time_to_visit: None,
        }
    }

    fn day(n: u32, activities: Vec<Activity>) -> DayPlan {
        DayPlan {
            day: n,
            date: date(n),
            theme: String::new(),
            activities,
            meals: Vec::new(),
            accommodation_id: None,
            estimated_budget: 0.0,
            notes: None,
        }
    }

    fn weather(rain: f64, min: f64, max: f64) -> WeatherObservation {
        WeatherObservation {
            location: "Munnar".to_string(),
            date: date(1),
            condition: "Rain".to_string(),
            temp_min_c: min,
            temp_max_c: max,
            precipitation_mm: rain,
            humidity_pct: 70.0,
            wind_speed_ms: 2.0,
        }
    }

    fn mixed_day() -> DayPlan {
        day(
            1,
            vec![
                activity("Tea estate trek", Some(TravelInterest::Nature)),
                activity("Spice market", Some(TravelInterest::Shopping)),
                activity("Uncategorized", None),
            ],
        )
    }

    #[test]
    fn rule_table() {
        let cases: &[(f64, f64, f64, Option<Impact>, &str)] = &[
            (8.0, 20.0, 28.0, Some(Impact::High), "Heavy Rain Expected on Day 1"),
            (5.0, 20.0, 28.0, Some(Impact::Medium), "Light Rain Expected on Day 1"),
            (1.0, 20.0, 28.0, None, ""),
            (0.0, 20.0, 25.0, None, ""),
            (0.0, 30.0, 41.0, Some(Impact::Medium), "High Temperature Alert - Day 1"),
            (0.0, 4.0, 12.0, Some(Impact::Medium), "Cold Weather Alert - Day 1"),
            (0.0, 5.0, 40.0, None, ""),
            (8.0, 30.0, 42.0, Some(Impact::High), "Heavy Rain Expected on Day 1"),
            (3.0, 2.0, 10.0, Some(Impact::Medium), "Light Rain Expected on Day 1"),
        ];

        let d = mixed_day();
        for (rain, min, max, impact, title) in cases {
            let got = evaluate(&d, &weather(*rain, *min, *max));
            assert_eq!(got.as_ref().map(|a| a.impact), *impact, "rain={rain} min={min} max={max}");
            if let Some(a) = got {
                assert_eq!(a.title, *title);
            }
        }
    }

    #[test]
    fn heavy_rain_suggests_gear_and_indoor_options() {
        let d = mixed_day();
        let a = evaluate(&d, &weather(8.0, 20.0, 28.0)).unwrap();
        assert!(a.suggested_actions.iter().any(|s| s.contains("rain gear")));
        assert!(a.suggested_actions.iter().any(|s| s.contains("indoor alternatives")));
        assert_eq!(a.affected_activity_ids, vec![d.activities[0].id]);
        assert_eq!(a.date, d.date);
    }

    #[test]
    fn rain_and_heat_actions_accumulate() {
        let a = evaluate(&mixed_day(), &weather(3.0, 30.0, 42.0)).unwrap();
        assert_eq!(a.impact, Impact::Medium);
        assert_eq!(a.suggested_actions.len(), 4);
        assert_eq!(a.suggested_actions[0], "Bring umbrella or light rain jacket");
        assert_eq!(a.suggested_actions[1], "Stay hydrated");
    }

    #[test]
    fn indoor_day_never_gets_an_advisory() {
        let d = day(
            1,
            vec![
                activity("Museum", Some(TravelInterest::Heritage)),
                activity("Cooking class", Some(TravelInterest::Culinary)),
            ],
        );
        assert!(evaluate(&d, &weather(50.0, -10.0, 45.0)).is_none());
        assert!(evaluate(&day(2, Vec::new()), &weather(50.0, -10.0, 45.0)).is_none());
    }

    #[test]
    fn tips_follow_condition() {
        assert_eq!(condition_tips("Rain").len(), 2);
        assert_eq!(condition_tips(" clouds "), vec!["Good weather for sightseeing"]);
        assert!(condition_tips("Haze").is_empty());
    }

    fn itinerary(days: Vec<DayPlan>) -> Itinerary {
        let now = Utc::now();
        Itinerary {
            id: Uuid::new_v4(),
            trip_request_id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            destination: "Munnar".to_string(),
            overview: None,
            duration_days: days.len() as u32,
            total_budget: 0.0,
            currency: "INR".to_string(),
            days,
            accommodations: Vec::new(),
            transport: Vec::new(),
            cost_breakdown: CostBreakdown::from_categories(0.0, 0.0, 0.0, 0.0, 0.0, "INR"),
            recommendations: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    #[test]
    fn alternatives_only_for_high_impact() {
        let it = itinerary(vec![mixed_day()]);
        let high = evaluate(&it.days[0], &weather(8.0, 20.0, 28.0)).unwrap();
        let alts = indoor_alternatives(&it, &high);
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].original_activity_id, it.days[0].activities[0].id);
        assert_eq!(alts[0].name, "Indoor alternative to Tea estate trek");
        assert_eq!(alts[0].cost, 800.0);
        assert_eq!(alts[0].duration_hours, 3.0);
        assert_eq!(alts[0].location, it.days[0].activities[0].location);

        let medium = evaluate(&it.days[0], &weather(3.0, 20.0, 28.0)).unwrap();
        assert!(indoor_alternatives(&it, &medium).is_empty());
    }

    struct FixedForecast(Vec<ForecastSlot>, std::sync::atomic::AtomicUsize);

    #[async_trait::async_trait]
    impl WeatherProvider for FixedForecast {
        async fn forecast(&self, location: &str) -> anyhow::Result<Vec<ForecastSlot>> {
            assert_eq!(location, "Munnar");
            self.1.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn check_itinerary_fetches_once_and_reports_uncovered_days() {
        let slot = |d: u32, h: u32, rain: f64| ForecastSlot {
            at: Utc.with_ymd_and_hms(2026, 7, d, h, 0, 0).unwrap(),
            condition: "Rain".to_string(),
            temp_min_c: 18.0,
            temp_max_c: 24.0,
            humidity_pct: 90.0,
            wind_speed_ms: 3.0,
            rain_mm: rain,
            utc_offset_s: 0,
        };
        let provider = FixedForecast(
            vec![slot(1, 6, 4.0), slot(1, 9, 4.5), slot(2, 6, 0.0)],
            Default::default(),
        );

        let mut d2 = mixed_day();
        d2.day = 2;
        d2.date = date(2);
        let mut d3 = mixed_day();
        d3.day = 3;
        d3.date = date(3);
        let it = itinerary(vec![mixed_day(), d2, d3, day(4, Vec::new())]);

        let report = check_itinerary(&it, &provider).await.unwrap();
        assert_eq!(provider.1.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(report.advisories.len(), 1);
        assert_eq!(report.advisories[0].impact, Impact::High);
        assert_eq!(report.indoor_alternatives.len(), 1);
        assert_eq!(report.forecasts.len(), 2);
        assert_eq!(report.forecasts[0].tips.len(), 2);
        assert_eq!(report.uncovered_days, vec![3]);
    }
}
