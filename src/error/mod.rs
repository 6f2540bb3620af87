// Error types for ecochat
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EcoChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Cache document {path} is corrupt: {source}")]
    CacheCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Inference backend error: {0}")]
    Inference(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Emissions measurement error: {0}")]
    Measurement(String),

    #[error("Emissions log error: {0}")]
    EmissionsLog(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Convert EcoChatError to HTTP responses for Axum
impl IntoResponse for EcoChatError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            EcoChatError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
            EcoChatError::TooManyRequests(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limit_error"),
            EcoChatError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "overloaded_error")
            }
            EcoChatError::Inference(_) | EcoChatError::Http(_) => {
                (StatusCode::BAD_GATEWAY, "inference_error")
            }
            EcoChatError::Config(_) | EcoChatError::ConfigParsing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
            }
            EcoChatError::CacheCorrupt { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "cache_error"),
            EcoChatError::Measurement(_) | EcoChatError::EmissionsLog(_) | EcoChatError::Csv(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "emissions_error")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "api_error"),
        };

        let body = json!({
            "type": "error",
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, EcoChatError>;
