use crate::domain::contract::{LlmItineraryPayload, ParsedItinerary};
use crate::domain::trip::TripConstraints;
use serde_json::Value;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseFailure {
    #[error("malformed itinerary payload: {detail}")]
    MalformedPayload { detail: String, raw_output: String },
}

impl ParseFailure {
    fn malformed(detail: impl Into<String>, raw_output: &str) -> Self {
        ParseFailure::MalformedPayload {
            detail: detail.into(),
            raw_output: raw_output.to_string(),
        }
    }

    pub fn raw_output(&self) -> &str {
        match self {
            ParseFailure::MalformedPayload { raw_output, .. } => raw_output,
        }
    }
}

/// Pulls the JSON document out of model output.
///
/// A fenced block tagged `json` wins, then any fenced block, then the span from
/// the first `{` to the last `}`.
pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if let Some(inner) = fenced_block(trimmed) {
        return Some(inner.trim().to_string());
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

fn fenced_block(text: &str) -> Option<&str> {
    const FENCE: &str = "```";
    const JSON_FENCE: &str = "```json";

    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let after = match lower.find(JSON_FENCE) {
        Some(i) => i + JSON_FENCE.len(),
        None => text.find(FENCE)? + FENCE.len(),
    };
    let line_end = text[after..]
        .find('\n')
        .map_or(text.len(), |nl| after + nl);
    let info = text[after..line_end].trim();
    // Skip the rest of an info string such as "yaml" or "5" but never the payload itself.
    let body_start = if !info.is_empty() && info.chars().all(|c| c.is_ascii_alphanumeric()) {
        line_end
    } else {
        after
    };

    let rest = &text[body_start..];
    let end = rest.find(FENCE).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Parses raw model output into an itinerary for `constraints`.
///
/// `duration_days` comes from the request's date range; the produced day count
/// follows the payload and any disagreement is reported, not corrected.
pub fn parse_itinerary(
    text: &str,
    constraints: &TripConstraints,
    duration_days: u32,
) -> Result<ParsedItinerary, ParseFailure> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    if json_str.is_empty() {
        return Err(ParseFailure::malformed("model output is empty", text));
    }

    let value = serde_json::from_str::<Value>(&json_str)
        .map_err(|e| ParseFailure::malformed(format!("invalid JSON: {e}"), text))?;
    if !value.is_object() {
        return Err(ParseFailure::malformed(
            "top-level JSON value is not an object",
            text,
        ));
    }

    let payload = serde_json::from_value::<LlmItineraryPayload>(value)
        .map_err(|e| ParseFailure::malformed(format!("itinerary schema mismatch: {e}"), text))?;
    let parsed = payload.into_itinerary(constraints, duration_days);

    if let Some(mismatch) = parsed.day_count_mismatch {
        tracing::warn!(
            trip_request_id = %constraints.id,
            requested = mismatch.requested,
            produced = mismatch.produced,
            "model returned a different number of days than requested"
        );
    }
    if let Some(adj) = parsed.cost_adjustment {
        tracing::warn!(
            trip_request_id = %constraints.id,
            stated = adj.stated,
            computed = adj.computed,
            "cost breakdown total disagrees with its categories; using category sum"
        );
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::itinerary::Coordinates;
    use crate::domain::trip::{TravelInterest, TripRequestDraft};
    use serde_json::json;

    fn constraints(start: &str, end: &str) -> TripConstraints {
        serde_json::from_value::<TripRequestDraft>(json!({
            "destination": "Jaipur",
            "start_date": start,
            "end_date": end,
            "budget": {"min": 20000.0, "max": 60000.0, "currency": "INR"},
            "interests": ["heritage", "nature"],
        }))
        .unwrap()
        .into_constraints("user-1")
        .unwrap()
    }

    fn payload(days: usize) -> Value {
        let days: Vec<_> = (1..=days)
            .map(|d| {
                json!({
                    "day": d,
                    "theme": format!("Theme {d}"),
                    "activities": [{
                        "name": "Amber Fort",
                        "description": "Hilltop fort",
                        "category": "heritage",
                        "location": {"name": "Amber Fort", "address": "Devisinghpura, Amer"},
                        "duration": 3,
                        "cost": 500,
                        "rating": 4.6
                    }, {
                        "name": "Nahargarh trek",
                        "category": "nature",
                        "location": {"name": "Nahargarh", "address": "Krishna Nagar"},
                        "duration": "2",
                        "cost": "₹0"
                    }],
                    "meals": [{
                        "type": "lunch",
                        "restaurant": "LMB",
                        "cuisine": "Rajasthani",
                        "location": {"name": "LMB", "address": "Johari Bazaar"},
                        "estimatedCost": 400,
                        "specialties": ["Dal Baati"]
                    }],
                    "estimatedBudget": 2500
                })
            })
            .collect();

        json!({
            "overview": "Pink city in a hurry",
            "days": days,
            "accommodations": [{
                "name": "Haveli Inn",
                "type": "homestay",
                "location": {"name": "Haveli Inn", "address": "MI Road"},
                "rating": 4.1,
                "pricePerNight": 3000,
                "amenities": ["WiFi"]
            }],
            "transport": [],
            "costBreakdown": {
                "accommodation": 6000,
                "transport": 2000,
                "activities": 1000,
                "meals": 1600,
                "miscellaneous": 400,
                "total": 11000
            },
            "recommendations": [{"type": "restaurant", "title": "Try lassi", "reasons": ["cheap"]}]
        })
    }

    #[test]
    fn extract_json_handles_fenced_blocks() {
        let body = "{\"a\":1}";
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(extract_json(&fenced), Some(body.to_string()));
    }

    #[test]
    fn extract_json_prefers_json_fence_amid_prose() {
        let s = "Here is your plan:\n```json{\"a\":{\"b\":2}}```\nEnjoy {the} trip!";
        assert_eq!(extract_json(s), Some("{\"a\":{\"b\":2}}".to_string()));
    }

    #[test]
    fn extract_json_skips_plain_fence_info_string() {
        let s = "```JSON5\n{\"a\":1}\n```";
        assert_eq!(extract_json(s), Some("{\"a\":1}".to_string()));
        let s = "```{\"a\":1}```";
        assert_eq!(extract_json(s), Some("{\"a\":1}".to_string()));
    }

    #[test]
    fn extract_json_falls_back_to_braces() {
        let s = "prefix {\"a\":1} suffix";
        assert_eq!(extract_json(s), Some("{\"a\":1}".to_string()));
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn parses_fenced_payload_wrapped_in_prose() {
        let c = constraints("2026-03-01", "2026-03-02");
        let text = format!(
            "Sure! Here's the itinerary.\n```json\n{}\n```\nLet me know if you need changes.",
            payload(2)
        );

        let parsed = parse_itinerary(&text, &c, 2).unwrap();
        let it = parsed.itinerary;
        assert_eq!(parsed.day_count_mismatch, None);
        assert_eq!(it.trip_request_id, c.id);
        assert_eq!(it.user_id, "user-1");
        assert_eq!(it.duration_days, 2);
        assert_eq!(it.version, 1);
        assert_eq!(it.currency, "INR");
        assert_eq!(it.days.len(), 2);
        assert_eq!(it.days[1].date, c.start_date.succ_opt().unwrap());
        assert_eq!(it.overview.as_deref(), Some("Pink city in a hurry"));

        let first = &it.days[0].activities[0];
        assert_eq!(first.category, Some(TravelInterest::Heritage));
        assert_eq!(first.location.coordinates, Coordinates::UNKNOWN);
        assert!(first.location.place_id.is_none());
        assert_ne!(first.id, it.days[1].activities[0].id);
        assert_eq!(it.days[0].activities[1].duration_hours, 2.0);
        assert_eq!(it.days[0].meals[0].specialties, vec!["Dal Baati".to_string()]);
    }

    #[test]
    fn cost_total_always_matches_categories() {
        let c = constraints("2026-03-01", "2026-03-02");
        let parsed = parse_itinerary(&payload(2).to_string(), &c, 2).unwrap();
        let cost = &parsed.itinerary.cost_breakdown;
        assert!(cost.is_consistent());
        assert_eq!(cost.total, 11000.0);
        assert_eq!(parsed.itinerary.total_budget, 11000.0);
        assert!(parsed.cost_adjustment.is_none());

        let mut wrong = payload(2);
        wrong["costBreakdown"]["total"] = json!(99999);
        let parsed = parse_itinerary(&wrong.to_string(), &c, 2).unwrap();
        assert_eq!(parsed.itinerary.cost_breakdown.total, 11000.0);
        assert!(parsed.itinerary.cost_breakdown.is_consistent());
        assert_eq!(parsed.cost_adjustment.unwrap().stated, 99999.0);
    }

    #[test]
    fn missing_total_is_computed() {
        let c = constraints("2026-03-01", "2026-03-02");
        let mut p = payload(2);
        p["costBreakdown"].as_object_mut().unwrap().remove("total");
        let parsed = parse_itinerary(&p.to_string(), &c, 2).unwrap();
        assert_eq!(parsed.itinerary.cost_breakdown.total, 11000.0);
        assert!(parsed.cost_adjustment.is_none());
    }

    #[test]
    fn day_count_follows_payload_and_mismatch_is_reported() {
        let c = constraints("2026-03-01", "2026-03-04");
        let duration = c.duration_days().unwrap();
        assert_eq!(duration, 4);

        let parsed = parse_itinerary(&payload(3).to_string(), &c, duration).unwrap();
        assert_eq!(parsed.itinerary.days.len(), 3);
        assert_eq!(parsed.itinerary.duration_days, 4);
        let mismatch = parsed.day_count_mismatch.unwrap();
        assert_eq!((mismatch.requested, mismatch.produced), (4, 3));
    }

    #[test]
    fn empty_day_list_is_a_mismatch_not_a_failure() {
        let c = constraints("2026-03-01", "2026-03-02");
        let parsed = parse_itinerary(r#"{"days": []}"#, &c, 2).unwrap();
        assert!(parsed.itinerary.days.is_empty());
        let mismatch = parsed.day_count_mismatch.unwrap();
        assert_eq!((mismatch.requested, mismatch.produced), (2, 0));
    }

    #[test]
    fn empty_activity_and_meal_lists_are_legal() {
        let c = constraints("2026-03-01", "2026-03-01");
        let text = json!({"days": [{"day": 1, "activities": [], "meals": []}]}).to_string();
        let parsed = parse_itinerary(&text, &c, 1).unwrap();
        assert!(parsed.itinerary.days[0].activities.is_empty());
        assert!(parsed.itinerary.days[0].meals.is_empty());
    }

    #[test]
    fn non_json_output_is_malformed() {
        let c = constraints("2026-03-01", "2026-03-02");
        let err = parse_itinerary("I'm sorry, I can't help with that.", &c, 2).unwrap_err();
        assert!(matches!(err, ParseFailure::MalformedPayload { .. }));
        assert_eq!(err.raw_output(), "I'm sorry, I can't help with that.");
    }

    #[test]
    fn truncated_json_is_malformed() {
        let c = constraints("2026-03-01", "2026-03-02");
        let text = "```json\n{\"days\": [{\"day\": 1, \"activities\": [\n```";
        assert!(parse_itinerary(text, &c, 2).is_err());
    }

    #[test]
    fn payload_without_days_is_malformed() {
        let c = constraints("2026-03-01", "2026-03-02");
        assert!(parse_itinerary("{\"overview\": \"hi\"}", &c, 2).is_err());
        assert!(parse_itinerary("[1, 2, 3]", &c, 2).is_err());
    }
}
