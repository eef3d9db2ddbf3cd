//! Venue and geocoding models
//!
//! Field names mirror the subset of the Places API the service touches, so
//! model-generated venue JSON and upstream responses both deserialize into
//! the same shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic point as the Places API encodes it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

/// A single user review attached to a place
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlaceReview {
    pub author_name: String,
    pub rating: Option<f64>,
    pub text: Option<String>,
    pub relative_time_description: Option<String>,
}

/// Contact block assembled from place details
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Contact {
    pub phone: String,
    pub website: String,
    pub address: String,
}

/// A recommended venue: hotel, restaurant, attraction, or agency.
///
/// Upstream field names are kept verbatim; fields this service adds on top
/// (booking metadata) use the response casing the booking UI expects.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Venue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_level: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vicinity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// Resolved photo URLs, not raw photo references
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<PlaceReview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// Agency/guide speciality when the model supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    #[serde(rename = "bookingUrl", skip_serializing_if = "Option::is_none")]
    pub booking_url: Option<String>,
    pub verified: bool,
    #[serde(rename = "lastUpdate", skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

impl Venue {
    /// Key used when deduplicating merged recommendation lists: the stable
    /// place id when the venue came from the Places API, otherwise the name.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        match &self.place_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => self.name.trim().to_lowercase(),
        }
    }
}

/// A geocoded location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Geocoded {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<i64>,
}

/// Aggregate venue data for one destination
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationData {
    pub location: Geocoded,
    pub hotels: Vec<Venue>,
    pub restaurants: Vec<Venue>,
    pub attractions: Vec<Venue>,
    pub agencies: Vec<Venue>,
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_prefers_place_id() {
        let venue = Venue {
            place_id: Some("ChIJd7zN_thW8TkR9vrd".to_string()),
            name: "Hotel Annapurna".to_string(),
            ..Default::default()
        };
        assert_eq!(venue.dedup_key(), "ChIJd7zN_thW8TkR9vrd");
    }

    #[test]
    fn test_dedup_key_falls_back_to_name() {
        let venue = Venue {
            name: "  Dal Bhat House ".to_string(),
            ..Default::default()
        };
        assert_eq!(venue.dedup_key(), "dal bhat house");
    }

    #[test]
    fn test_venue_tolerates_sparse_model_output() {
        // Model-generated venue lists rarely carry the full field set
        let venue: Venue =
            serde_json::from_str(r#"{"name": "Himalayan Kitchen", "rating": 4.3}"#).unwrap();
        assert_eq!(venue.name, "Himalayan Kitchen");
        assert_eq!(venue.rating, Some(4.3));
        assert!(venue.place_id.is_none());
        assert!(!venue.verified);
    }

    #[test]
    fn test_booking_url_casing() {
        let venue = Venue {
            name: "Hotel Yak".to_string(),
            booking_url: Some("https://example.com".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&venue).unwrap();
        assert!(json.get("bookingUrl").is_some());
        assert!(json.get("booking_url").is_none());
    }
}
