//! Places API client
//!
//! Geocoding (Nominatim), nearby search, and per-place details, each call
//! wrapped in the TTL cache keyed by its request signature. Upstream
//! failures degrade to empty results; only missing configuration is fatal.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{Contact, Geocoded, Geometry, LocationData, PlaceReview, Venue};
use crate::{API_CLIENT, cache, config::Config};

pub mod nominatim;

const DEFAULT_RADIUS_M: u32 = 5000;
const DETAILS_FIELDS: &str = "name,rating,formatted_phone_number,formatted_address,website,opening_hours,photos,reviews,price_level,user_ratings_total,geometry";
/// Pause between per-place detail fetches to stay under the rate limit
const DETAILS_PACING: Duration = Duration::from_millis(100);

/// Map a frontend category onto a Places API type. Unknown values pass
/// through untouched.
#[must_use]
pub fn normalize_place_type(kind: &str) -> &str {
    match kind {
        "hotel" | "hotels" => "lodging",
        "agency" | "agencies" => "travel_agency",
        // No dedicated type for guides upstream; agencies are the closest
        "guide" | "guides" => "travel_agency",
        "attraction" | "attractions" => "tourist_attraction",
        other => other,
    }
}

/// A place as the Nearby Search endpoint returns it
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Place {
    pub place_id: Option<String>,
    pub name: String,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub price_level: Option<u8>,
    pub types: Vec<String>,
    pub vicinity: Option<String>,
    pub geometry: Option<Geometry>,
    pub photos: Vec<PhotoRef>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoRef {
    pub photo_reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OpeningHours {
    pub open_now: Option<bool>,
}

/// The richer record from the Place Details endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlaceDetails {
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub price_level: Option<u8>,
    pub formatted_phone_number: Option<String>,
    pub formatted_address: Option<String>,
    pub website: Option<String>,
    pub geometry: Option<Geometry>,
    pub photos: Vec<PhotoRef>,
    pub reviews: Vec<PlaceReview>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
}

/// Places API client
pub struct PlacesClient {
    api_key: String,
    base_url: String,
    nominatim_base_url: String,
    cache_ttl: Duration,
}

impl PlacesClient {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.places_api_key.clone(),
            base_url: config.places_base_url.clone(),
            nominatim_base_url: config.nominatim_base_url.clone(),
            cache_ttl: config.cache_ttl,
        }
    }

    /// Geocode a free-text location. Searches within Nepal unless the query
    /// already names it. `None` when nothing matches or upstream is down.
    #[tracing::instrument(skip(self))]
    pub async fn geocode(&self, location: &str) -> Option<Geocoded> {
        let key = format!("geocode_{location}");
        if let Some(cached) = cache_lookup::<Geocoded>(&key).await {
            return Some(cached);
        }

        let query = if location.to_lowercase().contains("nepal") {
            location.to_string()
        } else {
            format!("{location}, Nepal")
        };

        let places = match nominatim::search(&self.nominatim_base_url, &query).await {
            Ok(places) => places,
            Err(e) => {
                warn!("Geocoding failed for '{}': {}", location, e);
                return None;
            }
        };

        let geocoded = places.first().and_then(|p| match p.to_geocoded() {
            Ok(g) => Some(g),
            Err(e) => {
                warn!("Unusable geocoding result for '{}': {}", location, e);
                None
            }
        })?;

        info!(
            "Geocoded '{}': {:.4}, {:.4}",
            location, geocoded.lat, geocoded.lon
        );
        cache_store(&key, &geocoded, self.cache_ttl).await;
        Some(geocoded)
    }

    /// Nearby venue search. Empty on upstream failure or zero results.
    #[tracing::instrument(skip(self))]
    pub async fn nearby_search(
        &self,
        lat: f64,
        lon: f64,
        kind: Option<&str>,
        radius: Option<u32>,
    ) -> Vec<Place> {
        let place_type = kind.map(normalize_place_type);
        let radius = radius.unwrap_or(DEFAULT_RADIUS_M);
        let key = format!(
            "nearby_{lat}_{lon}_{}_{radius}",
            place_type.unwrap_or("any")
        );
        if let Some(cached) = cache_lookup::<Vec<Place>>(&key).await {
            return cached;
        }

        let mut url = format!(
            "{}/nearbysearch/json?location={lat},{lon}&radius={radius}&key={}",
            self.base_url, self.api_key
        );
        if let Some(place_type) = place_type {
            url.push_str(&format!("&type={place_type}"));
        }

        let places = match self.fetch_nearby(&url).await {
            Ok(places) => places,
            Err(e) => {
                warn!("Nearby search failed: {}", e);
                return Vec::new();
            }
        };

        debug!("Nearby search returned {} places", places.len());
        cache_store(&key, &places, cache::jittered(self.cache_ttl)).await;
        places
    }

    async fn fetch_nearby(&self, url: &str) -> Result<Vec<Place>> {
        let response = API_CLIENT.get(url).send().await?;
        let body: NearbyResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse nearby search response")?;

        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(body.results),
            status => Err(anyhow::anyhow!("Places API answered status {status}")),
        }
    }

    /// Detailed record for one place. `None` when the place is unknown or
    /// upstream fails.
    #[tracing::instrument(skip(self))]
    pub async fn place_details(&self, place_id: &str) -> Option<PlaceDetails> {
        let key = format!("details_{place_id}");
        if let Some(cached) = cache_lookup::<PlaceDetails>(&key).await {
            return Some(cached);
        }

        let url = format!(
            "{}/details/json?place_id={}&fields={}&key={}",
            self.base_url,
            urlencoding::encode(place_id),
            DETAILS_FIELDS,
            self.api_key
        );

        let details = match self.fetch_details(&url).await {
            Ok(details) => details?,
            Err(e) => {
                warn!("Place details failed for {}: {}", place_id, e);
                return None;
            }
        };

        cache_store(&key, &details, cache::jittered(self.cache_ttl)).await;
        Some(details)
    }

    async fn fetch_details(&self, url: &str) -> Result<Option<PlaceDetails>> {
        let response = API_CLIENT.get(url).send().await?;
        let body: DetailsResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse place details response")?;

        if body.status == "OK" {
            Ok(body.result)
        } else {
            debug!("Place details status {}", body.status);
            Ok(None)
        }
    }

    /// URL of a place photo at the requested width.
    #[must_use]
    pub fn photo_url(&self, photo_reference: &str, max_width: u32) -> String {
        format!(
            "{}/photo?photoreference={}&maxwidth={max_width}&key={}",
            self.base_url,
            urlencoding::encode(photo_reference),
            self.api_key
        )
    }

    /// Geocode a location, find nearby venues of one kind, and merge in the
    /// detail record for the top `limit` of them.
    #[tracing::instrument(skip(self))]
    pub async fn search_by_type(&self, location: &str, kind: &str, limit: usize) -> Vec<Venue> {
        let Some(geocoded) = self.geocode(location).await else {
            warn!("Could not geocode '{}', skipping {} search", location, kind);
            return Vec::new();
        };

        let places = self
            .nearby_search(geocoded.lat, geocoded.lon, Some(kind), None)
            .await;

        let mut venues = Vec::with_capacity(limit.min(places.len()));
        for place in places.into_iter().take(limit) {
            let details = match &place.place_id {
                Some(id) => self.place_details(id).await,
                None => None,
            };
            venues.push(self.to_venue(place, details));
            tokio::time::sleep(DETAILS_PACING).await;
        }
        venues
    }

    /// Aggregate venue data for one destination. `None` when the location
    /// cannot be geocoded.
    pub async fn location_data(&self, location: &str) -> Option<LocationData> {
        let geocoded = self.geocode(location).await?;

        let (hotels, restaurants, attractions, agencies) = futures::join!(
            self.search_by_type(location, "hotel", 8),
            self.search_by_type(location, "restaurant", 8),
            self.search_by_type(location, "attraction", 8),
            self.search_by_type(location, "agency", 5),
        );

        Some(LocationData {
            location: geocoded,
            hotels,
            restaurants,
            attractions,
            agencies,
            last_updated: Utc::now(),
        })
    }

    /// Merge a nearby record and its optional detail record into a venue.
    /// Detail fields win where both carry a value.
    fn to_venue(&self, place: Place, details: Option<PlaceDetails>) -> Venue {
        let details = details.unwrap_or_default();
        let photos = details
            .photos
            .iter()
            .map(|p| self.photo_url(&p.photo_reference, 800))
            .collect();
        let contact = Contact {
            phone: details.formatted_phone_number.clone().unwrap_or_default(),
            website: details.website.clone().unwrap_or_default(),
            address: details
                .formatted_address
                .clone()
                .or_else(|| place.vicinity.clone())
                .unwrap_or_default(),
        };

        Venue {
            place_id: place.place_id,
            name: details.name.unwrap_or(place.name),
            rating: details.rating.or(place.rating),
            user_ratings_total: details.user_ratings_total.or(place.user_ratings_total),
            price_level: details.price_level.or(place.price_level),
            types: place.types,
            vicinity: place.vicinity,
            formatted_address: details.formatted_address,
            geometry: details.geometry.or(place.geometry),
            photos,
            reviews: details.reviews,
            contact: Some(contact),
            speciality: None,
            booking_url: None,
            verified: false,
            last_update: None,
        }
    }
}

async fn cache_lookup<T: serde::de::DeserializeOwned>(key: &str) -> Option<T> {
    match cache::get::<T>(key).await {
        Ok(hit) => hit,
        Err(e) => {
            warn!("Cache read failed for {}: {}", key, e);
            None
        }
    }
}

async fn cache_store<T: Serialize + std::fmt::Debug>(key: &str, value: &T, ttl: Duration) {
    if let Err(e) = cache::put(key, value, ttl).await {
        warn!("Cache write failed for {}: {}", key, e);
    }
}
