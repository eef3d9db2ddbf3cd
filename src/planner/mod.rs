//! Trip planning pipeline
//!
//! Orchestrates the full `plan-trip` flow: extract preferences, fan out to
//! the Places API and the model, derive an itinerary, estimate a budget,
//! and merge everything into one recommendation document.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::analyzer::Analyzer;
use crate::gemini::{self, TextModel};
use crate::models::{
    ChatMessage, DayPlan, LlmRecommendations, LocationData, Recommendations, TripAnalysis, Venue,
};
use crate::places::PlacesClient;

pub mod budget;
pub mod itinerary;

const MAX_HOTELS: usize = 10;
const MAX_RESTAURANTS: usize = 10;
const MAX_ACTIVITIES: usize = 10;
const MAX_AGENCIES: usize = 5;

pub struct TripPlanner {
    places: Arc<PlacesClient>,
    analyzer: Analyzer,
    model: Arc<dyn TextModel>,
}

impl TripPlanner {
    pub fn new(places: Arc<PlacesClient>, model: Arc<dyn TextModel>) -> Self {
        Self {
            places,
            analyzer: Analyzer::new(model.clone()),
            model,
        }
    }

    /// Process the planning conversation into aggregated recommendations.
    pub async fn plan_trip(&self, conversation: &[ChatMessage]) -> Result<Recommendations> {
        let analysis = self
            .analyzer
            .analyze(conversation)
            .await
            .context("Could not analyze trip requirements")?;
        info!(destination = %analysis.destination, "Planning trip");

        // Live venue data and model suggestions are independent; fetch both
        // at once. Either side may come back empty.
        let (location_data, suggestions) = tokio::join!(
            self.places.location_data(&analysis.destination),
            self.analyzer.recommendations_for(&analysis),
        );

        let itinerary = self
            .precise_itinerary(&analysis, location_data.as_ref(), &suggestions)
            .await;

        let budget_hotels: &[Venue] = location_data
            .as_ref()
            .map_or(&[], |data| data.hotels.as_slice());
        let budget = budget::calculate(&analysis, budget_hotels);

        let (hotels, restaurants, attractions, agencies) = match location_data {
            Some(data) => (data.hotels, data.restaurants, data.attractions, data.agencies),
            None => Default::default(),
        };

        let data_confidence = analysis
            .confidence
            .clone()
            .unwrap_or_else(|| "high".to_string());

        Ok(Recommendations {
            hotels: stamp_booking(
                merge_venues(hotels, suggestions.hotels, MAX_HOTELS),
                Some(hotel_booking_url),
            ),
            restaurants: stamp_booking(
                merge_venues(restaurants, suggestions.restaurants, MAX_RESTAURANTS),
                Some(restaurant_booking_url),
            ),
            activities: stamp_booking(
                merge_venues(attractions, suggestions.activities, MAX_ACTIVITIES),
                None,
            ),
            agencies: stamp_booking(
                merge_venues(agencies, suggestions.agencies, MAX_AGENCIES),
                None,
            ),
            guides: suggestions.guides,
            trip_analysis: analysis,
            itinerary,
            budget,
            last_updated: Utc::now(),
            data_confidence,
        })
    }

    /// Day-by-day itinerary from the model. The reply is used as JSON when
    /// it parses, scanned as plan text when it doesn't, and replaced by a
    /// synthesized skeleton when both fail.
    async fn precise_itinerary(
        &self,
        analysis: &TripAnalysis,
        location_data: Option<&LocationData>,
        suggestions: &LlmRecommendations,
    ) -> Value {
        let prompt = match itinerary_prompt(analysis, location_data, suggestions) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Could not build itinerary prompt: {}", e);
                return basic_itinerary_value(analysis);
            }
        };

        let reply = match gemini::generate_with_fallback(self.model.as_ref(), &prompt).await {
            Ok((reply, _)) => reply,
            Err(e) => {
                warn!("Itinerary generation failed: {}", e);
                return basic_itinerary_value(analysis);
            }
        };

        let cleaned = gemini::extract_json(&reply);
        if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(&cleaned) {
            return value;
        }

        let parsed = itinerary::parse_plan_text(&reply);
        if parsed.is_empty() {
            warn!("Itinerary reply was neither JSON nor plan text");
            basic_itinerary_value(analysis)
        } else {
            serde_json::to_value(parsed).unwrap_or_else(|_| basic_itinerary_value(analysis))
        }
    }
}

fn itinerary_prompt(
    analysis: &TripAnalysis,
    location_data: Option<&LocationData>,
    suggestions: &LlmRecommendations,
) -> Result<String> {
    Ok(format!(
        r#"Create a precise, day-by-day itinerary for this trip:

Trip Details: {}
Available Places: {}
Recommendations: {}

Generate a detailed itinerary with specific timing, real place names,
transportation between locations, meal recommendations, accommodation for
each night, and estimated costs.

Return as a JSON array with this structure:
[
  {{
    "day": 1,
    "date": "Day 1",
    "title": "Arrival and Exploration",
    "location": "Kathmandu",
    "activities": ["Airport pickup", "Evening walk in Thamel"],
    "description": "Private transfer to hotel and a first look at the city."
  }}
]

Return only the JSON array."#,
        serde_json::to_string(analysis)?,
        serde_json::to_string(&location_data)?,
        serde_json::to_string(suggestions)?,
    ))
}

/// One generic entry per day when no usable itinerary came back.
fn basic_itinerary(analysis: &TripAnalysis) -> Vec<DayPlan> {
    let default_activities = ["Explore local area", "Cultural experience"];
    let activities: Vec<String> = if analysis.activities.is_empty() {
        default_activities.iter().map(|s| s.to_string()).collect()
    } else {
        analysis.activities.iter().take(2).cloned().collect()
    };

    (1..=analysis.duration_days())
        .map(|day| DayPlan {
            day,
            date: format!("Day {day}"),
            title: format!("Day {day} - {}", analysis.destination),
            location: analysis.destination.clone(),
            description: String::new(),
            activities: activities.clone(),
        })
        .collect()
}

fn basic_itinerary_value(analysis: &TripAnalysis) -> Value {
    serde_json::to_value(basic_itinerary(analysis)).unwrap_or(Value::Array(Vec::new()))
}

/// Concatenate two venue lists, keep the first occurrence per dedup key,
/// and cap the result.
pub(crate) fn merge_venues(primary: Vec<Venue>, secondary: Vec<Venue>, cap: usize) -> Vec<Venue> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for venue in primary.into_iter().chain(secondary) {
        if merged.len() >= cap {
            break;
        }
        if venue.name.trim().is_empty() {
            continue;
        }
        if seen.insert(venue.dedup_key()) {
            merged.push(venue);
        }
    }

    merged
}

/// Booking metadata stamped on merged lists: a booking link when the
/// category has one, whether the venue is backed by a stable place id, and
/// the merge timestamp.
fn stamp_booking(mut venues: Vec<Venue>, fallback_url: Option<fn(&Venue) -> String>) -> Vec<Venue> {
    let now = Utc::now();
    for venue in &mut venues {
        if let Some(fallback) = fallback_url {
            let website = venue
                .contact
                .as_ref()
                .map(|contact| contact.website.clone())
                .filter(|website| !website.is_empty());
            let booking_url = website.unwrap_or_else(|| fallback(venue));
            venue.booking_url = Some(booking_url);
        }
        venue.verified = venue.place_id.is_some();
        venue.last_update = Some(now);
    }
    venues
}

fn hotel_booking_url(venue: &Venue) -> String {
    format!(
        "https://www.booking.com/search.html?ss={}",
        urlencoding::encode(&venue.name)
    )
}

fn restaurant_booking_url(venue: &Venue) -> String {
    let phone = venue
        .contact
        .as_ref()
        .map(|contact| contact.phone.as_str())
        .unwrap_or_default();
    format!("tel:{phone}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::gemini::ScriptedModel;
    use std::time::Duration;

    fn named(name: &str) -> Venue {
        Venue {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_dedupes_by_name() {
        let primary = vec![named("Hotel Shanker"), named("Hotel Yak")];
        let secondary = vec![named("hotel shanker"), named("Hotel Barahi")];

        let merged = merge_venues(primary, secondary, 10);
        let names: Vec<&str> = merged.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Hotel Shanker", "Hotel Yak", "Hotel Barahi"]);
    }

    #[test]
    fn test_merge_dedupes_by_place_id_first() {
        let a = Venue {
            place_id: Some("id1".to_string()),
            name: "Old Listing".to_string(),
            ..Default::default()
        };
        let b = Venue {
            place_id: Some("id1".to_string()),
            name: "Fresh Listing".to_string(),
            ..Default::default()
        };

        let merged = merge_venues(vec![a], vec![b], 10);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "Old Listing");
    }

    #[test]
    fn test_merge_caps_and_skips_unnamed() {
        let primary: Vec<Venue> = (0..8).map(|i| named(&format!("Venue {i}"))).collect();
        let mut secondary = vec![named("  ")];
        secondary.extend((8..20).map(|i| named(&format!("Venue {i}"))));

        let merged = merge_venues(primary, secondary, 10);
        assert_eq!(merged.len(), 10);
        assert!(merged.iter().all(|v| !v.name.trim().is_empty()));
    }

    #[test]
    fn test_stamp_booking_prefers_website() {
        let with_site = Venue {
            name: "Hotel Shanker".to_string(),
            place_id: Some("id1".to_string()),
            contact: Some(crate::models::Contact {
                website: "https://shankerhotel.com.np".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let without = named("Hotel Yak");

        let stamped = stamp_booking(vec![with_site, without], Some(hotel_booking_url));
        assert_eq!(
            stamped[0].booking_url.as_deref(),
            Some("https://shankerhotel.com.np")
        );
        assert!(stamped[0].verified);
        assert!(
            stamped[1]
                .booking_url
                .as_deref()
                .unwrap()
                .starts_with("https://www.booking.com/search.html?ss=Hotel%20Yak")
        );
        assert!(!stamped[1].verified);
    }

    #[test]
    fn test_basic_itinerary_shape() {
        let analysis = TripAnalysis {
            destination: "Pokhara".to_string(),
            duration: Some("3 days".to_string()),
            activities: vec!["paragliding".to_string(), "boating".to_string(), "yoga".to_string()],
            ..Default::default()
        };

        let days = basic_itinerary(&analysis);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].title, "Day 1 - Pokhara");
        assert_eq!(days[2].activities, vec!["paragliding", "boating"]);
    }

    /// Places client pointed at a dead port: every upstream call degrades
    /// to empty data, which is exactly the offline planning path.
    fn offline_places() -> Arc<PlacesClient> {
        let config = Config {
            port: 0,
            places_api_key: "test".to_string(),
            gemini_api_key: "test".to_string(),
            places_base_url: "http://127.0.0.1:1".to_string(),
            nominatim_base_url: "http://127.0.0.1:1".to_string(),
            gemini_base_url: "http://127.0.0.1:1".to_string(),
            cache_ttl: Duration::from_secs(60),
        };
        Arc::new(PlacesClient::new(&config))
    }

    #[tokio::test]
    async fn test_plan_trip_merges_model_output_when_upstream_is_down() {
        let analysis_reply =
            r#"{"destination": "Pokhara", "duration": "2", "groupSize": "2", "confidence": "medium"}"#;
        let recommendations_reply = r#"{
            "hotels": [{"name": "Hotel Barahi", "rating": 4.4}],
            "restaurants": [{"name": "Moondance", "rating": 4.5}],
            "guides": [{"name": "Mingma", "speciality": "Annapurna"}]
        }"#;
        let itinerary_reply =
            r#"[{"day": 1, "date": "Day 1", "title": "Lakeside", "location": "Pokhara"}]"#;

        let model = Arc::new(ScriptedModel::new([
            analysis_reply,
            recommendations_reply,
            itinerary_reply,
        ]));
        let planner = TripPlanner::new(offline_places(), model);

        let conversation = [ChatMessage::new("user", "2 days in Pokhara for two")];
        let plan = planner.plan_trip(&conversation).await.unwrap();

        assert_eq!(plan.trip_analysis.destination, "Pokhara");
        assert_eq!(plan.hotels.len(), 1);
        assert_eq!(plan.hotels[0].name, "Hotel Barahi");
        assert!(plan.hotels[0].booking_url.is_some());
        assert_eq!(plan.guides[0].name, "Mingma");
        assert_eq!(plan.data_confidence, "medium");
        assert!(plan.itinerary.is_array());
        assert_eq!(plan.itinerary.as_array().unwrap().len(), 1);
        // Budget falls back to style base prices with no live hotels
        assert_eq!(plan.budget.breakdown.accommodation.total, 100.0);
    }

    #[tokio::test]
    async fn test_plan_trip_parses_textual_itinerary() {
        let analysis_reply = r#"{"destination": "Kathmandu", "duration": "2"}"#;
        let recommendations_reply = r#"{"hotels": []}"#;
        let itinerary_reply = "Day 1 - Arrival in Kathmandu\nVisit: Durbar Square\nDay 2 - Nagarkot sunrise";

        let model = Arc::new(ScriptedModel::new([
            analysis_reply,
            recommendations_reply,
            itinerary_reply,
        ]));
        let planner = TripPlanner::new(offline_places(), model);

        let conversation = [ChatMessage::new("user", "short Kathmandu break")];
        let plan = planner.plan_trip(&conversation).await.unwrap();

        let days = plan.itinerary.as_array().unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0]["location"], "Kathmandu");
        assert_eq!(days[0]["activities"][0], "Durbar Square");
        assert_eq!(days[1]["location"], "Nagarkot");
    }

    #[tokio::test]
    async fn test_plan_trip_fails_without_analysis() {
        let model = Arc::new(ScriptedModel::new(["total gibberish"]));
        let planner = TripPlanner::new(offline_places(), model);

        let conversation = [ChatMessage::new("user", "hi")];
        assert!(planner.plan_trip(&conversation).await.is_err());
    }
}
