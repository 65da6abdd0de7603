//! Upstream error normalization
//!
//! Turns a failed upstream response into a [`ProxyError`], an envelope that
//! always serializes. Upstream bodies may be JSON, text, or binary. If the
//! body cannot be re-serialized the envelope drops it and keeps only the
//! status and a message.

use axum::http::StatusCode;
use bytes::Bytes;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::error::ErrorResponse;

/// Raw upstream error body, classified by content
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    Empty,
    Json(Value),
    Text(String),
    Binary(Bytes),
}

impl UpstreamBody {
    pub fn from_bytes(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return UpstreamBody::Empty;
        }
        if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
            return UpstreamBody::Json(value);
        }
        match std::str::from_utf8(&bytes) {
            Ok(text) => UpstreamBody::Text(text.to_string()),
            Err(_) => UpstreamBody::Binary(bytes),
        }
    }
}

impl Serialize for UpstreamBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UpstreamBody::Empty => serializer.serialize_none(),
            UpstreamBody::Json(value) => value.serialize(serializer),
            UpstreamBody::Text(text) => serializer.serialize_str(text),
            UpstreamBody::Binary(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

/// Normalized upstream failure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyError {
    pub status: u16,
    pub status_text: Option<String>,
    pub message: String,
    pub body: Option<Value>,
}

impl ProxyError {
    /// Normalize an upstream response that arrived with a failure status.
    pub fn from_upstream<B>(status: StatusCode, body: &B) -> Self
    where
        B: Serialize + ?Sized,
    {
        match serde_json::to_value(body) {
            Ok(value) => {
                let body = Some(value).filter(|v| !v.is_null());
                let message = body
                    .as_ref()
                    .and_then(extract_message)
                    .unwrap_or_else(|| default_message(status));
                Self {
                    status: status.as_u16(),
                    status_text: status.canonical_reason().map(str::to_string),
                    message,
                    body,
                }
            }
            Err(e) => {
                warn!(
                    status = %status.as_u16(),
                    error = %e,
                    "Upstream error body could not be serialized, using minimal envelope"
                );
                Self::minimal(status)
            }
        }
    }

    /// Envelope carrying only the status and a generic message
    pub fn minimal(status: StatusCode) -> Self {
        Self {
            status: status.as_u16(),
            status_text: None,
            message: default_message(status),
            body: None,
        }
    }

    /// Status returned to the caller, mirroring the upstream one
    pub fn http_status(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY)
    }

    pub fn envelope(&self) -> ErrorResponse {
        ErrorResponse {
            error: "Upstream request failed".to_string(),
            message: self.message.clone(),
            status: Some(self.status),
            status_text: self.status_text.clone(),
            data: self.body.clone(),
        }
    }
}

/// Pull a readable message out of the usual provider error shapes.
fn extract_message(body: &Value) -> Option<String> {
    let candidates = [
        body.pointer("/error/message"),
        body.get("message"),
        body.get("error"),
        body.get("detail"),
    ];

    if let Value::String(text) = body {
        return Some(truncate(text));
    }

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(truncate)
}

fn truncate(text: &str) -> String {
    const MAX_MESSAGE_CHARS: usize = 500;
    text.trim().chars().take(MAX_MESSAGE_CHARS).collect()
}

fn default_message(status: StatusCode) -> String {
    format!("Upstream responded with status {}", status.as_u16())
}
