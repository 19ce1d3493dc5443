use crate::domain::itinerary::{
    Accommodation, AccommodationKind, Activity, CostBreakdown, DayPlan, Itinerary, Location,
    Meal, MealType, Recommendation, RecommendationKind, TransportMode, Transportation,
    COST_TOLERANCE,
};
use crate::domain::trip::{TravelInterest, TripConstraints};
use crate::time::trip_dates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Itinerary document as emitted by the model. Every field is optional and
/// tolerant of `null`, numeric strings and stray types.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmItineraryPayload {
    #[serde(deserialize_with = "lenient::opt_text")]
    pub overview: Option<String>,
    #[serde(deserialize_with = "lenient::seq")]
    pub days: Vec<LlmDay>,
    #[serde(deserialize_with = "lenient::seq")]
    pub accommodations: Vec<LlmAccommodation>,
    #[serde(deserialize_with = "lenient::seq")]
    pub transport: Vec<LlmTransport>,
    pub cost_breakdown: Option<LlmCostBreakdown>,
    #[serde(deserialize_with = "lenient::seq")]
    pub recommendations: Vec<LlmRecommendation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmDay {
    #[serde(deserialize_with = "lenient::opt_number")]
    pub day: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub theme: Option<String>,
    #[serde(deserialize_with = "lenient::seq")]
    pub activities: Vec<LlmActivity>,
    #[serde(deserialize_with = "lenient::seq")]
    pub meals: Vec<LlmMeal>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub accommodation: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub estimated_budget: f64,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmLocation {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmActivity {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(deserialize_with = "lenient::text")]
    pub category: String,
    #[serde(deserialize_with = "lenient::location")]
    pub location: Option<LlmLocation>,
    #[serde(deserialize_with = "lenient::number")]
    pub duration: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub cost: f64,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub rating: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub opening_hours: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub best_time_to_visit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmMeal {
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub meal_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub restaurant: String,
    #[serde(deserialize_with = "lenient::text")]
    pub cuisine: String,
    #[serde(deserialize_with = "lenient::location")]
    pub location: Option<LlmLocation>,
    #[serde(deserialize_with = "lenient::number")]
    pub estimated_cost: f64,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub rating: Option<f64>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub specialties: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmAccommodation {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(deserialize_with = "lenient::location")]
    pub location: Option<LlmLocation>,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub rating: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub price_per_night: f64,
    #[serde(deserialize_with = "lenient::text_list")]
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmTransport {
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub mode: String,
    #[serde(deserialize_with = "lenient::location")]
    pub from: Option<LlmLocation>,
    #[serde(deserialize_with = "lenient::location")]
    pub to: Option<LlmLocation>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub departure_time: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub arrival_time: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub cost: f64,
    #[serde(deserialize_with = "lenient::text")]
    pub provider: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmCostBreakdown {
    #[serde(deserialize_with = "lenient::number")]
    pub accommodation: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub transport: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub activities: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub meals: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub miscellaneous: f64,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub total: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmRecommendation {
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(deserialize_with = "lenient::location")]
    pub location: Option<LlmLocation>,
    #[serde(deserialize_with = "lenient::number")]
    pub estimated_cost: f64,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub rating: Option<f64>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub reasons: Vec<String>,
}

/// Requested vs produced day counts when the model disagrees with the date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCountMismatch {
    pub requested: u32,
    pub produced: u32,
}

/// A stated cost total that was replaced by the category sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostAdjustment {
    pub stated: f64,
    pub computed: f64,
}

#[derive(Debug, Clone)]
pub struct ParsedItinerary {
    pub itinerary: Itinerary,
    pub day_count_mismatch: Option<DayCountMismatch>,
    pub cost_adjustment: Option<CostAdjustment>,
}

impl LlmItineraryPayload {
    pub fn into_itinerary(self, constraints: &TripConstraints, duration_days: u32) -> ParsedItinerary {
        let now = Utc::now();
        let currency = constraints.budget.currency.clone();

        let accommodations: Vec<Accommodation> = self
            .accommodations
            .into_iter()
            .map(|acc| acc.into_accommodation(constraints))
            .collect();

        let days: Vec<DayPlan> = self
            .days
            .into_iter()
            .enumerate()
            .map(|(idx, day)| day.into_day_plan(idx, constraints, &accommodations))
            .collect();

        let produced = u32::try_from(days.len()).unwrap_or(u32::MAX);
        let day_count_mismatch = (produced != duration_days).then_some(DayCountMismatch {
            requested: duration_days,
            produced,
        });

        let (cost_breakdown, cost_adjustment) = self
            .cost_breakdown
            .unwrap_or_default()
            .into_cost_breakdown(&currency);

        let itinerary = Itinerary {
            id: Uuid::new_v4(),
            trip_request_id: constraints.id,
            user_id: constraints.user_id.clone(),
            destination: constraints.destination.clone(),
            overview: self.overview,
            duration_days,
            total_budget: cost_breakdown.total,
            currency,
            days,
            accommodations,
            transport: self
                .transport
                .into_iter()
                .map(LlmTransport::into_transportation)
                .collect(),
            cost_breakdown,
            recommendations: self
                .recommendations
                .into_iter()
                .map(LlmRecommendation::into_recommendation)
                .collect(),
            created_at: now,
            updated_at: now,
            version: 1,
        };

        ParsedItinerary {
            itinerary,
            day_count_mismatch,
            cost_adjustment,
        }
    }
}

impl LlmLocation {
    fn into_location(self, fallback_name: &str) -> Location {
        let name = non_empty_or(self.name, fallback_name);
        let address = non_empty_or(self.address, &name);
        Location::unresolved(name, address)
    }
}

fn location_or_named(loc: Option<LlmLocation>, fallback_name: &str) -> Location {
    loc.unwrap_or_default().into_location(fallback_name)
}

fn non_empty_or(value: String, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.trim().to_string()
    } else {
        trimmed.to_string()
    }
}

impl LlmDay {
    fn into_day_plan(
        self,
        idx: usize,
        constraints: &TripConstraints,
        accommodations: &[Accommodation],
    ) -> DayPlan {
        let day = self
            .day
            .filter(|d| *d >= 1.0 && d.fract() == 0.0 && *d <= f64::from(u32::MAX))
            .map(|d| d as u32)
            .unwrap_or(idx as u32 + 1);

        let accommodation_id = link_accommodation(self.accommodation.as_deref(), accommodations);

        DayPlan {
            day,
            date: trip_dates::day_date(constraints.start_date, idx),
            theme: self.theme.unwrap_or_else(|| format!("Day {}", idx + 1)),
            activities: self
                .activities
                .into_iter()
                .map(LlmActivity::into_activity)
                .collect(),
            meals: self.meals.into_iter().map(LlmMeal::into_meal).collect(),
            accommodation_id,
            estimated_budget: self.estimated_budget,
            notes: self.notes,
        }
    }
}

fn link_accommodation(label: Option<&str>, accommodations: &[Accommodation]) -> Option<Uuid> {
    if let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(acc) = accommodations
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(label))
        {
            return Some(acc.id);
        }
    }
    match accommodations {
        [only] => Some(only.id),
        _ => None,
    }
}

impl LlmActivity {
    fn into_activity(self) -> Activity {
        let name = self.name.trim().to_string();
        Activity {
            id: Uuid::new_v4(),
            location: location_or_named(self.location, &name),
            name,
            description: self.description.trim().to_string(),
            category: TravelInterest::from_label(&self.category),
            duration_hours: self.duration.max(0.0),
            cost: self.cost.max(0.0),
            rating: self.rating,
            opening_hours: self.opening_hours,
            best_time_to_visit: self.best_time_to_visit,
        }
    }
}

impl LlmMeal {
    fn into_meal(self) -> Meal {
        let restaurant = self.restaurant.trim().to_string();
        Meal {
            meal_type: MealType::from_label(&self.meal_type),
            location: location_or_named(self.location, &restaurant),
            restaurant,
            cuisine: self.cuisine.trim().to_string(),
            estimated_cost: self.estimated_cost.max(0.0),
            rating: self.rating,
            specialties: self.specialties,
        }
    }
}

impl LlmAccommodation {
    fn into_accommodation(self, constraints: &TripConstraints) -> Accommodation {
        let name = self.name.trim().to_string();
        Accommodation {
            id: Uuid::new_v4(),
            location: location_or_named(self.location, &name),
            name,
            kind: AccommodationKind::from_label(&self.kind),
            rating: self.rating,
            price_per_night: self.price_per_night.max(0.0),
            amenities: self.amenities,
            check_in: constraints.start_date,
            check_out: constraints.end_date,
        }
    }
}

impl LlmTransport {
    fn into_transportation(self) -> Transportation {
        Transportation {
            id: Uuid::new_v4(),
            mode: TransportMode::from_label(&self.mode),
            from: location_or_named(self.from, ""),
            to: location_or_named(self.to, ""),
            departure_time: self.departure_time.as_deref().and_then(parse_timestamp),
            arrival_time: self.arrival_time.as_deref().and_then(parse_timestamp),
            cost: self.cost.max(0.0),
            provider: self.provider.trim().to_string(),
        }
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

impl LlmCostBreakdown {
    fn into_cost_breakdown(self, currency: &str) -> (CostBreakdown, Option<CostAdjustment>) {
        let breakdown = CostBreakdown::from_categories(
            self.accommodation.max(0.0),
            self.transport.max(0.0),
            self.activities.max(0.0),
            self.meals.max(0.0),
            self.miscellaneous.max(0.0),
            currency,
        );

        let adjustment = self
            .total
            .filter(|stated| (stated - breakdown.total).abs() > COST_TOLERANCE)
            .map(|stated| CostAdjustment {
                stated,
                computed: breakdown.total,
            });

        (breakdown, adjustment)
    }
}

impl LlmRecommendation {
    fn into_recommendation(self) -> Recommendation {
        let title = self.title.trim().to_string();
        Recommendation {
            kind: RecommendationKind::from_label(&self.kind),
            location: self.location.map(|l| l.into_location(&title)),
            title,
            description: self.description.trim().to_string(),
            estimated_cost: self.estimated_cost.max(0.0),
            rating: self.rating,
            reasons: self.reasons,
        }
    }
}

mod lenient {
    use super::LlmLocation;
    use serde::de::{DeserializeOwned, Error};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(opt_number(d)?.unwrap_or(0.0))
    }

    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(value_to_number(&Value::deserialize(d)?))
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_text(d)?.unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(value_to_text(Value::deserialize(d)?))
    }

    pub fn text_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.into_iter().filter_map(value_to_text).collect(),
            Value::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Accepts a `{name, address}` object or a bare place string.
    pub fn location<'de, D: Deserializer<'de>>(d: D) -> Result<Option<LlmLocation>, D::Error> {
        match Value::deserialize(d)? {
            Value::Object(map) => serde_json::from_value(Value::Object(map))
                .map(Some)
                .map_err(D::Error::custom),
            Value::String(s) if !s.trim().is_empty() => Ok(Some(LlmLocation {
                name: s.trim().to_string(),
                address: s.trim().to_string(),
            })),
            _ => Ok(None),
        }
    }

    /// `null` becomes an empty list; any other non-array value is a schema error.
    pub fn seq<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Value::deserialize(d)? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
                .collect(),
            other => Err(D::Error::custom(format!(
                "expected an array, got {}",
                type_name(&other)
            ))),
        }
    }

    fn value_to_number(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
            Value::String(s) => parse_number_text(s),
            _ => None,
        }
    }

    fn value_to_text(v: Value) -> Option<String> {
        let s = match v {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Parses amounts like `"₹1,500"` or `"2.5 hours"`; ranges keep their lower bound.
    pub(super) fn parse_number_text(s: &str) -> Option<f64> {
        let mut out = String::new();
        let mut has_digit = false;
        for c in s.trim().chars() {
            match c {
                '0'..='9' => {
                    has_digit = true;
                    out.push(c);
                }
                '.' if has_digit => out.push(c),
                '-' if out.is_empty() => out.push(c),
                ',' | '_' | ' ' if has_digit => {}
                _ if !has_digit => {}
                _ => break,
            }
        }
        out.parse::<f64>().ok().filter(|f| f.is_finite())
    }

    fn type_name(v: &Value) -> &'static str {
        match v {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
        }
    }
}
