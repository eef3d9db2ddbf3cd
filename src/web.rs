use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::api::{self, AppState};
use crate::config::Config;
use crate::gemini::GeminiClient;
use crate::places::PlacesClient;
use crate::planner::TripPlanner;

/// Generous body limit: plan requests carry whole conversations.
const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;
/// Model calls dominate request time.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub fn build_state(config: &Config) -> AppState {
    let places = Arc::new(PlacesClient::new(config));
    let model: Arc<dyn crate::gemini::TextModel> = Arc::new(GeminiClient::new(config));
    let planner = Arc::new(TripPlanner::new(places.clone(), model.clone()));

    AppState {
        places,
        model,
        planner,
    }
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(state))
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}

pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config);
    let router = app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", config.port);
    axum::serve(listener, router)
        .await
        .context("Server terminated")?;
    Ok(())
}
