use crate::domain::labeled_enum;
use crate::time::trip_dates;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CURRENCY: &str = "INR";

labeled_enum! {
    pub enum TravelInterest ("interest") {
        Heritage => "heritage",
        Nightlife => "nightlife",
        Adventure => "adventure",
        Culinary => "culinary",
        Nature => "nature",
        Shopping => "shopping",
        Wellness => "wellness",
        Photography => "photography",
        Cultural => "cultural",
        Spiritual => "spiritual",
    }
}

impl TravelInterest {
    /// Categories whose activities happen outside and are exposed to weather.
    pub fn is_outdoor(self) -> bool {
        matches!(
            self,
            Self::Adventure | Self::Nature | Self::Photography | Self::Spiritual
        )
    }
}

labeled_enum! {
    pub enum TravelStyle ("travel style") {
        Budget => "budget",
        MidRange => "mid-range",
        Luxury => "luxury",
    }
}

labeled_enum! {
    pub enum AccommodationPreference ("accommodation preference") {
        Hotel => "hotel",
        Hostel => "hostel",
        Resort => "resort",
        Homestay => "homestay",
        Any => "any",
    }
}

labeled_enum! {
    pub enum TransportPreference ("transport preference") {
        Flight => "flight",
        Train => "train",
        Bus => "bus",
        Car => "car",
        Any => "any",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

/// One validated generation request. Build it through
/// [`TripRequestDraft::into_constraints`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripConstraints {
    pub id: Uuid,
    pub user_id: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: BudgetRange,
    pub group_size: u32,
    pub interests: Vec<TravelInterest>,
    pub travel_style: TravelStyle,
    pub accommodation_type: AccommodationPreference,
    pub transport_preference: TransportPreference,
    pub special_requirements: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TripConstraints {
    pub fn validate(&self) -> Result<(), TripValidationError> {
        if self.destination.trim().is_empty() {
            return Err(TripValidationError::EmptyDestination);
        }
        if self.end_date < self.start_date {
            return Err(TripValidationError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if !self.budget.min.is_finite() || !self.budget.max.is_finite() {
            return Err(TripValidationError::NonFiniteBudget);
        }
        if self.budget.min < 0.0 {
            return Err(TripValidationError::NegativeBudget {
                min: self.budget.min,
            });
        }
        if self.budget.min > self.budget.max {
            return Err(TripValidationError::InvertedBudget {
                min: self.budget.min,
                max: self.budget.max,
            });
        }
        if self.budget.currency.trim().is_empty() {
            return Err(TripValidationError::EmptyCurrency);
        }
        if self.group_size == 0 {
            return Err(TripValidationError::EmptyGroup);
        }
        Ok(())
    }

    /// Inclusive trip length in days.
    pub fn duration_days(&self) -> Result<u32, TripValidationError> {
        trip_dates::trip_length_days(self.start_date, self.end_date).ok_or(
            TripValidationError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TripValidationError {
    #[error("destination must be non-empty")]
    EmptyDestination,
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("start date {start} is after end date {end}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("budget bounds must be finite numbers")]
    NonFiniteBudget,
    #[error("budget minimum must be non-negative (got {min})")]
    NegativeBudget { min: f64 },
    #[error("budget minimum {min} exceeds maximum {max}")]
    InvertedBudget { min: f64, max: f64 },
    #[error("budget currency must be non-empty")]
    EmptyCurrency,
    #[error("group size must be at least 1")]
    EmptyGroup,
    #[error("user id must be non-empty")]
    MissingUser,
}

/// Inbound trip request as submitted by clients. Optional preferences get
/// their defaults when converted into [`TripConstraints`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequestDraft {
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub budget: BudgetDraft,
    #[serde(default)]
    pub group_size: Option<u32>,
    #[serde(default)]
    pub interests: Vec<TravelInterest>,
    #[serde(default)]
    pub travel_style: Option<TravelStyle>,
    #[serde(default)]
    pub accommodation_type: Option<AccommodationPreference>,
    #[serde(default)]
    pub transport_preference: Option<TransportPreference>,
    #[serde(default)]
    pub special_requirements: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetDraft {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

impl TripRequestDraft {
    pub fn into_constraints(self, user_id: &str) -> Result<TripConstraints, TripValidationError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(TripValidationError::MissingUser);
        }

        let start_date = trip_dates::parse_date(&self.start_date)
            .map_err(|e| TripValidationError::InvalidDate(format!("{e:#}")))?;
        let end_date = trip_dates::parse_date(&self.end_date)
            .map_err(|e| TripValidationError::InvalidDate(format!("{e:#}")))?;

        let currency = self
            .budget
            .currency
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let mut interests = Vec::with_capacity(self.interests.len());
        for interest in self.interests {
            if !interests.contains(&interest) {
                interests.push(interest);
            }
        }

        let constraints = TripConstraints {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            destination: self.destination.trim().to_string(),
            start_date,
            end_date,
            budget: BudgetRange {
                min: self.budget.min,
                max: self.budget.max,
                currency,
            },
            group_size: self.group_size.unwrap_or(1),
            interests,
            travel_style: self.travel_style.unwrap_or(TravelStyle::MidRange),
            accommodation_type: self
                .accommodation_type
                .unwrap_or(AccommodationPreference::Any),
            transport_preference: self.transport_preference.unwrap_or(TransportPreference::Any),
            special_requirements: self
                .special_requirements
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            created_at: Utc::now(),
        };

        constraints.validate()?;
        Ok(constraints)
    }
}

/// Saved per-user defaults. Applied to a draft only where the draft leaves a
/// field unset, so an explicit request always wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub interests: Vec<TravelInterest>,
    #[serde(default)]
    pub travel_style: Option<TravelStyle>,
    #[serde(default)]
    pub accommodation_type: Option<AccommodationPreference>,
    #[serde(default)]
    pub transport_preference: Option<TransportPreference>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl UserPreferences {
    pub fn apply_to(&self, draft: &mut TripRequestDraft) {
        if draft.interests.is_empty() {
            draft.interests = self.interests.clone();
        }
        draft.travel_style = draft.travel_style.or(self.travel_style);
        draft.accommodation_type = draft.accommodation_type.or(self.accommodation_type);
        draft.transport_preference = draft.transport_preference.or(self.transport_preference);
        if draft.budget.currency.is_none() {
            draft.budget.currency = self.currency.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripRequestStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl TripRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}
