//! Error types and handling for `Yatra`

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Main error type for the `Yatra` service
#[derive(Error, Debug)]
pub enum YatraError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream API communication errors
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    /// Generative-AI model errors
    #[error("Model error: {message}")]
    Model { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Requested resource does not exist upstream
    #[error("Not found: {message}")]
    NotFound { message: String },
}

impl YatraError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new upstream API error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Create a new model error
    pub fn model<S: Into<String>>(message: S) -> Self {
        Self::Model {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            YatraError::Validation { .. } => StatusCode::BAD_REQUEST,
            YatraError::NotFound { .. } => StatusCode::NOT_FOUND,
            YatraError::Config { .. }
            | YatraError::Upstream { .. }
            | YatraError::Model { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for YatraError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = YatraError::config("missing API key");
        assert!(matches!(config_err, YatraError::Config { .. }));

        let upstream_err = YatraError::upstream("connection failed");
        assert!(matches!(upstream_err, YatraError::Upstream { .. }));

        let validation_err = YatraError::validation("invalid coordinates");
        assert!(matches!(validation_err, YatraError::Validation { .. }));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            YatraError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            YatraError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            YatraError::upstream("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            YatraError::model("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
