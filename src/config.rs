//! Environment-driven configuration.
//!
//! Everything the service needs is read from the process environment once
//! at startup; missing API keys fail fast instead of surfacing as opaque
//! upstream errors mid-request.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds on
    pub port: u16,
    /// Google Places API key
    pub places_api_key: String,
    /// Gemini API key
    pub gemini_api_key: String,
    /// Base URL of the Places API
    pub places_base_url: String,
    /// Base URL of the Nominatim geocoding service
    pub nominatim_base_url: String,
    /// Base URL of the generative-AI API
    pub gemini_base_url: String,
    /// How long upstream responses stay cached
    pub cache_ttl: Duration,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("Invalid PORT value: {raw}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let cache_ttl = match env::var("CACHE_TTL_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .with_context(|| format!("Invalid CACHE_TTL_SECS value: {raw}"))?,
            ),
            Err(_) => Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        };

        Ok(Self {
            port,
            places_api_key: env::var("GOOGLE_PLACES_API_KEY")
                .context("Missing GOOGLE_PLACES_API_KEY env var")?,
            gemini_api_key: env::var("GEMINI_API_KEY").context("Missing GEMINI_API_KEY env var")?,
            places_base_url: env_or("PLACES_BASE_URL", "https://maps.googleapis.com/maps/api/place"),
            nominatim_base_url: env_or(
                "NOMINATIM_BASE_URL",
                "https://nominatim.openstreetmap.org",
            ),
            gemini_base_url: env_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
            cache_ttl,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            port: DEFAULT_PORT,
            places_api_key: "places_test_key".to_string(),
            gemini_api_key: "gemini_test_key".to_string(),
            places_base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            nominatim_base_url: "https://nominatim.openstreetmap.org".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }

    #[test]
    fn test_defaults() {
        let config = test_config();
        assert_eq!(config.port, 5000);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert!(config.places_base_url.starts_with("https://"));
    }

    #[test]
    fn test_env_or_falls_back() {
        let value = env_or("YATRA_TEST_UNSET_VAR", "fallback");
        assert_eq!(value, "fallback");
    }
}
