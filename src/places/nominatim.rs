//! Free geocoding via the OpenStreetMap Nominatim API.
//!
//! Nominatim requires a descriptive `User-Agent` (set on the shared client)
//! and returns coordinates as strings.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::API_CLIENT;
use crate::models::Geocoded;

#[derive(Debug, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    pub place_id: Option<i64>,
}

impl NominatimPlace {
    pub fn to_geocoded(&self) -> Result<Geocoded> {
        Ok(Geocoded {
            lat: self
                .lat
                .parse()
                .with_context(|| format!("Invalid latitude: {}", self.lat))?,
            lon: self
                .lon
                .parse()
                .with_context(|| format!("Invalid longitude: {}", self.lon))?,
            display_name: self.display_name.clone(),
            place_id: self.place_id,
        })
    }
}

pub async fn search(base_url: &str, query: &str) -> Result<Vec<NominatimPlace>> {
    let url = format!(
        "{}/search?q={}&format=json&limit=1",
        base_url,
        urlencoding::encode(query)
    );

    let response = API_CLIENT.get(url).send().await?;
    let places: Vec<NominatimPlace> = response
        .json()
        .await
        .with_context(|| "Failed to parse Nominatim response")?;
    Ok(places)
}
