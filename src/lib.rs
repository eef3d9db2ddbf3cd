//! `Yatra` - AI-assisted travel planning and recommendations
//!
//! This library provides the backend for conversational trip planning:
//! trip-preference extraction with a generative-AI model, live venue data
//! from the Places API, budgeting, and itinerary assembly.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

pub mod analyzer;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gemini;
pub mod models;
pub mod places;
pub mod planner;
pub mod web;

// Re-export core types for public API
pub use analyzer::Analyzer;
pub use config::Config;
pub use error::YatraError;
pub use gemini::{GeminiClient, TextModel};
pub use models::{ChatMessage, Recommendations, TripAnalysis, Venue};
pub use places::PlacesClient;
pub use planner::TripPlanner;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Shared outbound HTTP client. Retries transient upstream failures with
/// exponential backoff; the user agent is mandatory for Nominatim.
pub static API_CLIENT: LazyLock<ClientWithMiddleware> = LazyLock::new(|| {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(2);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("Yatra/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client");

    ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
