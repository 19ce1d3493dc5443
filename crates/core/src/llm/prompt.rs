use crate::domain::trip::TripConstraints;
use crate::places::PlaceDetails;

/// JSON shape the model is asked to emit. Mirrors `domain::contract`.
const OUTPUT_SCHEMA: &str = r#"{
  "overview": "Brief trip overview",
  "days": [
    {
      "day": 1,
      "theme": "Day theme",
      "activities": [
        {
          "name": "Activity name",
          "description": "Detailed description",
          "category": "heritage|nightlife|adventure|culinary|nature|shopping|wellness|photography|cultural|spiritual",
          "location": {"name": "Location name", "address": "Full address"},
          "duration": 2.5,
          "cost": 500,
          "rating": 4.5,
          "bestTimeToVisit": "Morning|Afternoon|Evening",
          "openingHours": "9 AM - 6 PM"
        }
      ],
      "meals": [
        {
          "type": "breakfast|lunch|dinner|snack",
          "restaurant": "Restaurant name",
          "cuisine": "Cuisine",
          "location": {"name": "Restaurant name", "address": "Full address"},
          "estimatedCost": 300,
          "rating": 4.2,
          "specialties": ["Dish 1", "Dish 2"]
        }
      ],
      "accommodation": "Name of the accommodation used that night",
      "estimatedBudget": 2000,
      "notes": "Optional notes"
    }
  ],
  "accommodations": [
    {
      "name": "Hotel name",
      "type": "hotel|hostel|resort|homestay",
      "location": {"name": "Hotel name", "address": "Full address"},
      "rating": 4.3,
      "pricePerNight": 3000,
      "amenities": ["WiFi", "AC", "Breakfast"]
    }
  ],
  "transport": [
    {
      "type": "flight|train|bus|taxi|rental-car",
      "from": {"name": "Origin", "address": "Origin address"},
      "to": {"name": "Destination", "address": "Destination address"},
      "cost": 5000,
      "provider": "Provider name"
    }
  ],
  "costBreakdown": {
    "accommodation": 15000,
    "transport": 8000,
    "activities": 12000,
    "meals": 9000,
    "miscellaneous": 3000,
    "total": 47000
  },
  "recommendations": [
    {
      "type": "activity|restaurant|accommodation|transport",
      "title": "Recommendation title",
      "description": "Why this is recommended",
      "estimatedCost": 800,
      "rating": 4.4,
      "reasons": ["Reason 1", "Reason 2"]
    }
  ]
}"#;

/// Renders the generation prompt. Same inputs always produce the same text.
pub fn build_itinerary_prompt(
    constraints: &TripConstraints,
    duration_days: u32,
    destination: Option<&PlaceDetails>,
) -> String {
    let budget = &constraints.budget;
    let budget_range = format!(
        "{} {} - {} {}",
        budget.currency,
        format_amount(budget.min),
        budget.currency,
        format_amount(budget.max)
    );
    let interests = if constraints.interests.is_empty() {
        "general sightseeing".to_string()
    } else {
        constraints
            .interests
            .iter()
            .map(|i| i.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut out = String::new();
    out.push_str(&format!(
        "You are an expert travel planner. Generate a detailed, personalized {duration_days}-day itinerary for {}.\n\n",
        constraints.destination
    ));

    out.push_str("TRIP DETAILS:\n");
    out.push_str(&format!("- Destination: {}\n", constraints.destination));
    out.push_str(&format!(
        "- Dates: {} to {} ({duration_days} days)\n",
        constraints.start_date, constraints.end_date
    ));
    out.push_str(&format!("- Budget: {budget_range}\n"));
    out.push_str(&format!("- Group Size: {} people\n", constraints.group_size));
    out.push_str(&format!("- Travel Style: {}\n", constraints.travel_style));
    out.push_str(&format!("- Interests: {interests}\n"));
    out.push_str(&format!(
        "- Accommodation Type: {}\n",
        constraints.accommodation_type
    ));
    out.push_str(&format!(
        "- Transport Preference: {}\n",
        constraints.transport_preference
    ));
    out.push_str(&format!(
        "- Special Requirements: {}\n",
        constraints.special_requirements.as_deref().unwrap_or("None")
    ));

    if let Some(place) = destination {
        out.push_str("\nDESTINATION CONTEXT:\n");
        out.push_str(&format!("- Resolved place: {}\n", place.name));
        if !place.address.is_empty() {
            out.push_str(&format!("- Address: {}\n", place.address));
        }
        if !place.coordinates.is_unknown() {
            out.push_str(&format!(
                "- Coordinates: {:.5}, {:.5}\n",
                place.coordinates.latitude, place.coordinates.longitude
            ));
        }
        if let Some(rating) = place.rating {
            out.push_str(&format!("- Visitor rating: {rating:.1}\n"));
        }
    }

    out.push_str("\nREQUIREMENTS:\n");
    let requirements = [
        format!("Create exactly {duration_days} day entries with specific activities, timings and locations"),
        "Include accommodation recommendations with pricing".to_string(),
        "Suggest transportation options between locations".to_string(),
        "Recommend authentic local restaurants and cuisines".to_string(),
        "Provide cost estimates for each activity and meal as plain numbers".to_string(),
        format!("Favor the interests: {interests}"),
        format!("Stay within the budget range of {budget_range}"),
        "costBreakdown.total must equal the sum of the other costBreakdown fields".to_string(),
        "Include specific street addresses wherever possible".to_string(),
    ];
    for (idx, req) in requirements.iter().enumerate() {
        out.push_str(&format!("{}. {req}\n", idx + 1));
    }

    out.push_str("\nFORMAT YOUR RESPONSE AS A SINGLE JSON OBJECT (no prose) WITH THIS SCHEMA:\n");
    out.push_str(OUTPUT_SCHEMA);
    out.push('\n');
    out
}

fn format_amount(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::itinerary::Coordinates;
    use crate::domain::trip::TripRequestDraft;
    use serde_json::json;

    fn constraints() -> TripConstraints {
        serde_json::from_value::<TripRequestDraft>(json!({
            "destination": "Goa",
            "start_date": "2026-12-20",
            "end_date": "2026-12-24",
            "budget": {"min": 30000.0, "max": 45000.5, "currency": "inr"},
            "group_size": 2,
            "interests": ["nature", "culinary"],
            "travel_style": "luxury",
            "special_requirements": "vegetarian meals",
        }))
        .unwrap()
        .into_constraints("user-1")
        .unwrap()
    }

    #[test]
    fn prompt_embeds_every_constraint() {
        let c = constraints();
        let prompt = build_itinerary_prompt(&c, 5, None);
        assert!(prompt.contains("5-day itinerary for Goa"));
        assert!(prompt.contains("2026-12-20 to 2026-12-24"));
        assert!(prompt.contains("INR 30000 - INR 45000.50"));
        assert!(prompt.contains("Group Size: 2 people"));
        assert!(prompt.contains("Travel Style: luxury"));
        assert!(prompt.contains("Interests: nature, culinary"));
        assert!(prompt.contains("Accommodation Type: any"));
        assert!(prompt.contains("Special Requirements: vegetarian meals"));
        assert!(prompt.contains("\"costBreakdown\""));
        assert!(!prompt.contains("DESTINATION CONTEXT"));
    }

    #[test]
    fn prompt_is_deterministic_and_includes_context() {
        let c = constraints();
        let place = PlaceDetails {
            place_id: "abc".to_string(),
            name: "Goa, India".to_string(),
            address: "Goa, India".to_string(),
            coordinates: Coordinates::new(15.2993, 74.124),
            rating: Some(4.5),
            price_level: None,
            photos: Vec::new(),
            opening_hours: Vec::new(),
            website: None,
            phone_number: None,
        };
        let a = build_itinerary_prompt(&c, 5, Some(&place));
        let b = build_itinerary_prompt(&c, 5, Some(&place));
        assert_eq!(a, b);
        assert!(a.contains("Resolved place: Goa, India"));
        assert!(a.contains("Coordinates: 15.29930, 74.12400"));
    }
}
