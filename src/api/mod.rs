//! HTTP API
//!
//! JSON routes mounted under `/api`. Handlers validate input, delegate to
//! the clients, and wrap answers in the success envelopes the booking UI
//! consumes. Upstream trouble surfaces as soft failures wherever the
//! contract degrades instead of erroring.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{Json, Redirect};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzer::Analyzer;
use crate::error::YatraError;
use crate::gemini::{self, TextModel};
use crate::models::{ChatMessage, LocationData, Recommendations, TripAnalysis, Venue};
use crate::places::{self, PlacesClient};
use crate::planner::TripPlanner;

const DEFAULT_PHOTO_WIDTH: u32 = 800;
const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub places: Arc<PlacesClient>,
    pub model: Arc<dyn TextModel>,
    pub planner: Arc<TripPlanner>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/plan-trip", post(plan_trip))
        .route("/chat", post(chat))
        .route("/maps/geocode", get(maps_geocode))
        .route("/places/nearby", get(places_nearby))
        .route("/places/reviews", get(place_reviews))
        .route("/places/photo", get(place_photo))
        .route("/places/search", get(places_search))
        .route("/location-data/{location}", get(location_data))
        .route("/analyze/conversation", post(analyze_conversation))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Server is running",
        timestamp: Utc::now(),
    })
}

#[derive(Debug, Deserialize)]
struct ConversationRequest {
    #[serde(rename = "conversationHistory")]
    conversation_history: Option<Vec<ChatMessage>>,
}

impl ConversationRequest {
    fn history(self) -> Result<Vec<ChatMessage>, YatraError> {
        match self.conversation_history {
            Some(history) if !history.is_empty() => Ok(history),
            _ => Err(YatraError::validation(
                "Conversation history is required and must be a non-empty array",
            )),
        }
    }
}

#[derive(Serialize)]
struct PlanTripResponse {
    success: bool,
    data: Recommendations,
    message: &'static str,
}

async fn plan_trip(
    State(state): State<AppState>,
    Json(request): Json<ConversationRequest>,
) -> Result<Json<PlanTripResponse>, YatraError> {
    let history = request.history()?;

    let data = state
        .planner
        .plan_trip(&history)
        .await
        .map_err(|e| YatraError::model(format!("Failed to generate trip recommendations: {e}")))?;

    Ok(Json(PlanTripResponse {
        success: true,
        data,
        message: "Trip recommendations generated successfully",
    }))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatResponse {
    success: bool,
    reply: String,
    model: &'static str,
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, YatraError> {
    if request.messages.is_empty() {
        return Err(YatraError::validation("messages must be a non-empty array"));
    }

    let (reply, model) = gemini::chat_with_fallback(state.model.as_ref(), &request.messages)
        .await
        .map_err(|e| YatraError::model(format!("All models failed: {e}")))?;

    Ok(Json(ChatResponse {
        success: true,
        reply,
        model,
    }))
}

#[derive(Debug, Deserialize)]
struct GeocodeParams {
    q: String,
}

#[derive(Serialize)]
struct GeocodeResult {
    lat: f64,
    lon: f64,
    display_name: String,
}

#[derive(Serialize)]
struct GeocodeResponse {
    success: bool,
    result: Option<GeocodeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// Soft-failing by contract: a miss answers `success: false`, not an error
/// status.
async fn maps_geocode(
    State(state): State<AppState>,
    Query(params): Query<GeocodeParams>,
) -> Json<GeocodeResponse> {
    match state.places.geocode(&params.q).await {
        Some(geocoded) => Json(GeocodeResponse {
            success: true,
            result: Some(GeocodeResult {
                lat: geocoded.lat,
                lon: geocoded.lon,
                display_name: geocoded.display_name,
            }),
            message: None,
        }),
        None => Json(GeocodeResponse {
            success: false,
            result: None,
            message: Some("Location not found or API key not configured"),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct NearbyParams {
    lat: f64,
    lon: f64,
    #[serde(rename = "type")]
    kind: Option<String>,
    radius: Option<u32>,
}

#[derive(Serialize)]
struct NearbyEntry {
    name: String,
    lat: Option<f64>,
    lon: Option<f64>,
    place_id: Option<String>,
    address: Option<String>,
    rating: Option<f64>,
    #[serde(rename = "reviewsCount")]
    reviews_count: Option<u32>,
    types: Vec<String>,
    photo_reference: Option<String>,
}

impl From<places::Place> for NearbyEntry {
    fn from(place: places::Place) -> Self {
        let location = place.geometry.as_ref().map(|g| g.location);
        Self {
            name: place.name,
            lat: location.map(|l| l.lat),
            lon: location.map(|l| l.lng),
            place_id: place.place_id,
            address: place.vicinity,
            rating: place.rating,
            reviews_count: place.user_ratings_total,
            types: place.types,
            photo_reference: place.photos.into_iter().next().map(|p| p.photo_reference),
        }
    }
}

#[derive(Serialize)]
struct NearbyResponse {
    success: bool,
    results: Vec<NearbyEntry>,
}

async fn places_nearby(
    State(state): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> Json<NearbyResponse> {
    let places = state
        .places
        .nearby_search(params.lat, params.lon, params.kind.as_deref(), params.radius)
        .await;

    Json(NearbyResponse {
        success: true,
        results: places.into_iter().map(NearbyEntry::from).collect(),
    })
}

#[derive(Debug, Deserialize)]
struct ReviewsParams {
    place_id: String,
}

#[derive(Serialize)]
struct ReviewsResult {
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    reviews: Vec<crate::models::PlaceReview>,
    photos: Vec<places::PhotoRef>,
}

#[derive(Serialize)]
struct ReviewsResponse {
    success: bool,
    result: ReviewsResult,
}

async fn place_reviews(
    State(state): State<AppState>,
    Query(params): Query<ReviewsParams>,
) -> Result<Json<ReviewsResponse>, YatraError> {
    let details = state
        .places
        .place_details(&params.place_id)
        .await
        .ok_or_else(|| YatraError::not_found("Place not found"))?;

    Ok(Json(ReviewsResponse {
        success: true,
        result: ReviewsResult {
            rating: details.rating,
            user_ratings_total: details.user_ratings_total,
            reviews: details.reviews,
            photos: details.photos,
        },
    }))
}

#[derive(Debug, Deserialize)]
struct PhotoParams {
    /// Accepts both generations of the query contract
    #[serde(rename = "photoReference", alias = "ref")]
    photo_reference: Option<String>,
    #[serde(rename = "maxWidth", alias = "maxwidth")]
    max_width: Option<u32>,
}

async fn place_photo(
    State(state): State<AppState>,
    Query(params): Query<PhotoParams>,
) -> Result<Redirect, YatraError> {
    let reference = params
        .photo_reference
        .filter(|r| !r.is_empty())
        .ok_or_else(|| YatraError::validation("Photo reference is required"))?;

    let url = state
        .places
        .photo_url(&reference, params.max_width.unwrap_or(DEFAULT_PHOTO_WIDTH));
    Ok(Redirect::temporary(&url))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    location: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    success: bool,
    data: Vec<Venue>,
    count: usize,
}

async fn places_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let kind = params.kind.as_deref().unwrap_or("attraction");
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

    let data = state.places.search_by_type(&params.location, kind, limit).await;
    let count = data.len();

    Json(SearchResponse {
        success: true,
        data,
        count,
    })
}

#[derive(Serialize)]
struct LocationDataResponse {
    success: bool,
    data: LocationData,
}

async fn location_data(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> Result<Json<LocationDataResponse>, YatraError> {
    let data = state
        .places
        .location_data(&location)
        .await
        .ok_or_else(|| YatraError::not_found("Location data not found"))?;

    Ok(Json(LocationDataResponse {
        success: true,
        data,
    }))
}

#[derive(Serialize)]
struct AnalyzeResponse {
    success: bool,
    data: TripAnalysis,
}

async fn analyze_conversation(
    State(state): State<AppState>,
    Json(request): Json<ConversationRequest>,
) -> Result<Json<AnalyzeResponse>, YatraError> {
    let history = request.history()?;

    let data = Analyzer::new(state.model.clone())
        .analyze(&history)
        .await
        .map_err(|e| YatraError::model(format!("Failed to analyze conversation: {e}")))?;

    Ok(Json(AnalyzeResponse { success: true, data }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Geometry, LatLng};

    #[test]
    fn test_nearby_entry_flattens_geometry() {
        let place = places::Place {
            name: "Boudhanath Stupa".to_string(),
            place_id: Some("id9".to_string()),
            rating: Some(4.7),
            user_ratings_total: Some(12000),
            vicinity: Some("Boudha".to_string()),
            geometry: Some(Geometry {
                location: LatLng {
                    lat: 27.7215,
                    lng: 85.3620,
                },
            }),
            photos: vec![
                places::PhotoRef {
                    photo_reference: "first".to_string(),
                },
                places::PhotoRef {
                    photo_reference: "second".to_string(),
                },
            ],
            ..Default::default()
        };

        let entry = NearbyEntry::from(place);
        assert_eq!(entry.lat, Some(27.7215));
        assert_eq!(entry.lon, Some(85.3620));
        assert_eq!(entry.photo_reference.as_deref(), Some("first"));

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("reviewsCount").is_some());
    }

    #[test]
    fn test_conversation_request_rejects_empty() {
        let request: ConversationRequest =
            serde_json::from_str(r#"{"conversationHistory": []}"#).unwrap();
        assert!(request.history().is_err());

        let request: ConversationRequest = serde_json::from_str("{}").unwrap();
        assert!(request.history().is_err());
    }

    #[test]
    fn test_photo_params_accept_both_generations() {
        let params: PhotoParams =
            serde_json::from_str(r#"{"photoReference": "abc", "maxWidth": 600}"#).unwrap();
        assert_eq!(params.photo_reference.as_deref(), Some("abc"));
        assert_eq!(params.max_width, Some(600));

        let params: PhotoParams =
            serde_json::from_str(r#"{"ref": "xyz", "maxwidth": 400}"#).unwrap();
        assert_eq!(params.photo_reference.as_deref(), Some("xyz"));
        assert_eq!(params.max_width, Some(400));
    }
}
