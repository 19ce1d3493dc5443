use crate::domain::labeled_enum;
use crate::domain::trip::TravelInterest;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Placeholder carried by every location until enrichment resolves it.
    pub const UNKNOWN: Coordinates = Coordinates {
        latitude: 0.0,
        longitude: 0.0,
    };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// `lat,lng` as expected by the places and routing APIs.
    pub fn to_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

impl Location {
    pub fn unresolved(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            coordinates: Coordinates::UNKNOWN,
            place_id: None,
        }
    }

    pub fn is_enriched(&self) -> bool {
        !self.coordinates.is_unknown() && self.place_id.is_some()
    }

    /// Text used for geo lookups: the address, or the name when no address is known.
    pub fn lookup_query(&self) -> Option<&str> {
        [self.address.trim(), self.name.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

labeled_enum! {
    pub enum MealType ("meal type") {
        Breakfast => "breakfast",
        Lunch => "lunch",
        Dinner => "dinner",
        Snack => "snack",
    }
}

labeled_enum! {
    pub enum AccommodationKind ("accommodation type") {
        Hotel => "hotel",
        Hostel => "hostel",
        Resort => "resort",
        Homestay => "homestay",
    }
}

labeled_enum! {
    pub enum TransportMode ("transport type") {
        Flight => "flight",
        Train => "train",
        Bus => "bus",
        Taxi => "taxi",
        RentalCar => "rental-car",
    }
}

labeled_enum! {
    pub enum RecommendationKind ("recommendation type") {
        Activity => "activity",
        Restaurant => "restaurant",
        Accommodation => "accommodation",
        Transport => "transport",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: Option<TravelInterest>,
    pub location: Location,
    pub duration_hours: f64,
    pub cost: f64,
    pub rating: Option<f64>,
    pub opening_hours: Option<String>,
    pub best_time_to_visit: Option<String>,
}

impl Activity {
    pub fn is_outdoor(&self) -> bool {
        self.category.is_some_and(TravelInterest::is_outdoor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub meal_type: Option<MealType>,
    pub restaurant: String,
    pub cuisine: String,
    pub location: Location,
    pub estimated_cost: f64,
    pub rating: Option<f64>,
    pub specialties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accommodation {
    pub id: Uuid,
    pub name: String,
    pub kind: Option<AccommodationKind>,
    pub location: Location,
    pub rating: Option<f64>,
    pub price_per_night: f64,
    pub amenities: Vec<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transportation {
    pub id: Uuid,
    pub mode: Option<TransportMode>,
    pub from: Location,
    pub to: Location,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub cost: f64,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    pub date: NaiveDate,
    pub theme: String,
    pub activities: Vec<Activity>,
    pub meals: Vec<Meal>,
    pub accommodation_id: Option<Uuid>,
    pub estimated_budget: f64,
    pub notes: Option<String>,
}

impl DayPlan {
    pub fn outdoor_activities(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter().filter(|a| a.is_outdoor())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub accommodation: f64,
    pub transport: f64,
    pub activities: f64,
    pub meals: f64,
    pub miscellaneous: f64,
    pub total: f64,
    pub currency: String,
}

impl CostBreakdown {
    /// Builds a breakdown whose total is the sum of its categories.
    pub fn from_categories(
        accommodation: f64,
        transport: f64,
        activities: f64,
        meals: f64,
        miscellaneous: f64,
        currency: impl Into<String>,
    ) -> Self {
        let mut out = Self {
            accommodation,
            transport,
            activities,
            meals,
            miscellaneous,
            total: 0.0,
            currency: currency.into(),
        };
        out.total = out.category_sum();
        out
    }

    pub fn category_sum(&self) -> f64 {
        self.accommodation + self.transport + self.activities + self.meals + self.miscellaneous
    }

    pub fn is_consistent(&self) -> bool {
        (self.total - self.category_sum()).abs() <= COST_TOLERANCE
    }
}

/// Rounding slack allowed between a stated total and its category sum.
pub const COST_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: Option<RecommendationKind>,
    pub title: String,
    pub description: String,
    pub location: Option<Location>,
    pub estimated_cost: f64,
    pub rating: Option<f64>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub id: Uuid,
    pub trip_request_id: Uuid,
    pub user_id: String,
    pub destination: String,
    pub overview: Option<String>,
    pub duration_days: u32,
    pub total_budget: f64,
    pub currency: String,
    pub days: Vec<DayPlan>,
    pub accommodations: Vec<Accommodation>,
    pub transport: Vec<Transportation>,
    pub cost_breakdown: CostBreakdown,
    pub recommendations: Vec<Recommendation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
}

/// Addresses one enrichable location inside an [`Itinerary`] by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationSlot {
    Activity { day: usize, index: usize },
    Meal { day: usize, index: usize },
    Accommodation { index: usize },
}

impl Itinerary {
    /// Every location the enrichment pass covers, in document order.
    pub fn enrichable_slots(&self) -> Vec<LocationSlot> {
        let mut out = Vec::new();
        for (day_idx, day) in self.days.iter().enumerate() {
            out.extend((0..day.activities.len()).map(|index| LocationSlot::Activity {
                day: day_idx,
                index,
            }));
            out.extend((0..day.meals.len()).map(|index| LocationSlot::Meal {
                day: day_idx,
                index,
            }));
        }
        out.extend((0..self.accommodations.len()).map(|index| LocationSlot::Accommodation { index }));
        out
    }

    pub fn location(&self, slot: LocationSlot) -> Option<&Location> {
        match slot {
            LocationSlot::Activity { day, index } => self
                .days
                .get(day)
                .and_then(|d| d.activities.get(index))
                .map(|a| &a.location),
            LocationSlot::Meal { day, index } => self
                .days
                .get(day)
                .and_then(|d| d.meals.get(index))
                .map(|m| &m.location),
            LocationSlot::Accommodation { index } => {
                self.accommodations.get(index).map(|a| &a.location)
            }
        }
    }

    pub fn location_mut(&mut self, slot: LocationSlot) -> Option<&mut Location> {
        match slot {
            LocationSlot::Activity { day, index } => self
                .days
                .get_mut(day)
                .and_then(|d| d.activities.get_mut(index))
                .map(|a| &mut a.location),
            LocationSlot::Meal { day, index } => self
                .days
                .get_mut(day)
                .and_then(|d| d.meals.get_mut(index))
                .map(|m| &mut m.location),
            LocationSlot::Accommodation { index } => {
                self.accommodations.get_mut(index).map(|a| &mut a.location)
            }
        }
    }

    pub fn find_activity(&self, id: Uuid) -> Option<&Activity> {
        self.days
            .iter()
            .flat_map(|d| d.activities.iter())
            .find(|a| a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_breakdown_total_is_category_sum() {
        let c = CostBreakdown::from_categories(100.0, 50.0, 25.5, 30.0, 4.5, "INR");
        assert_eq!(c.total, 210.0);
        assert!(c.is_consistent());
    }

    #[test]
    fn location_lookup_prefers_address() {
        let loc = Location::unresolved("Hawa Mahal", "Badi Choupad, Jaipur");
        assert_eq!(loc.lookup_query(), Some("Badi Choupad, Jaipur"));
        let loc = Location::unresolved("Hawa Mahal", "  ");
        assert_eq!(loc.lookup_query(), Some("Hawa Mahal"));
        let loc = Location::unresolved("", "");
        assert_eq!(loc.lookup_query(), None);
        assert!(!loc.is_enriched());
    }

    #[test]
    fn transport_mode_label_with_space() {
        assert_eq!(TransportMode::from_label("Rental Car"), Some(TransportMode::RentalCar));
        assert_eq!(MealType::from_label("Dinner"), Some(MealType::Dinner));
    }
}
