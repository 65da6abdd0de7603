//! Error types for the proxy
//!
//! Every failure leaves the service as an HTTP response with the flat
//! envelope `{ error, message, status?, statusText?, data? }`.

use axum::{
    extract::rejection::BytesRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::proxy::normalize::ProxyError;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid authentication token: {0}")]
    InvalidToken(String),

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{capability} only supports {domain} endpoints")]
    UnsupportedProvider {
        capability: &'static str,
        domain: String,
    },

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { limit: u32, retry_after_secs: u64 },

    #[error("Upstream error: {}", .0.message)]
    Upstream(ProxyError),

    #[error("{0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Short summary of the failure class
    pub error: String,
    /// Human-readable detail
    pub message: String,
    /// Upstream HTTP status, when the provider answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Upstream status reason phrase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    /// Upstream error body, re-serialized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
            status_text: None,
            data: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("Unauthorized", self.to_string()),
            ),
            AppError::InvalidToken(_) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("Invalid token", self.to_string()),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new("Forbidden", self.to_string()),
            ),
            AppError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(
                    "Missing required fields",
                    format!("{} required", fields.join(", ")),
                ),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("Bad request", msg.clone()),
            ),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorResponse::new("Payload too large", msg.clone()),
            ),
            AppError::UnsupportedProvider { .. } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("Unsupported provider", self.to_string()),
            ),
            AppError::RateLimited {
                limit,
                retry_after_secs,
            } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ErrorResponse::new("Too many requests", self.to_string())),
                )
                    .into_response();
                let headers = response.headers_mut();
                headers.insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
                headers.insert(
                    header::HeaderName::from_static("x-ratelimit-limit"),
                    HeaderValue::from(*limit),
                );
                return response;
            }
            AppError::Upstream(proxy_error) => (proxy_error.http_status(), proxy_error.envelope()),
            AppError::Transport(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("Proxy request failed", msg.clone()),
            ),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error", "Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
