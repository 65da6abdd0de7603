//! Upstream provider abstraction layer
//!
//! Defines the trait the route handlers call to reach a third-party provider,
//! and the reqwest-backed implementation used in production.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use crate::error::AppError;
use crate::proxy::headers::build_upstream_headers;
use crate::proxy::normalize::{ProxyError, UpstreamBody};
use crate::proxy::request::{ProxyMode, ProxyRequest, UpstreamTimeouts};

/// Boxed error carried by relayed streams
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Stream of upstream response body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// A successful (2xx) upstream response whose body has not been read yet
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl UpstreamResponse {
    /// Build a response from an already materialized body.
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            headers,
            body: Box::pin(futures::stream::once(async move { Ok(body) })),
        }
    }
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Ways an upstream call can fail
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The provider answered with a non-success status
    #[error("upstream responded with {status}")]
    Status {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },

    #[error("upstream request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// No response was received (DNS, refused connection, TLS, reset)
    #[error("{0}")]
    Transport(String),

    /// The request could not be built from the caller's values
    #[error("{0}")]
    InvalidRequest(String),
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, body, .. } => {
                let body = UpstreamBody::from_bytes(body);
                AppError::Upstream(ProxyError::from_upstream(status, &body))
            }
            UpstreamError::Timeout(_) | UpstreamError::Transport(_) => {
                AppError::Transport(err.to_string())
            }
            UpstreamError::InvalidRequest(msg) => AppError::BadRequest(msg),
        }
    }
}

/// Trait defining the interface for upstream providers
///
/// Implementations MUST:
/// - Send only the caller-supplied provider key upstream, never the client's JWT
/// - Return non-2xx responses as [`UpstreamError::Status`] with the body read
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Get the upstream name for logging and health output
    fn name(&self) -> &'static str;

    /// Send a validated proxy request.
    async fn send(&self, request: ProxyRequest) -> Result<UpstreamResponse, UpstreamError>;
}

/// reqwest-backed upstream
pub struct HttpUpstream {
    client: reqwest::Client,
    timeouts: UpstreamTimeouts,
}

impl HttpUpstream {
    pub fn new(client: reqwest::Client, timeouts: UpstreamTimeouts) -> Self {
        Self { client, timeouts }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip_all, fields(capability = %request.capability))]
    async fn send(&self, request: ProxyRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = request.url();
        let timeout = request.mode.timeout(&self.timeouts);

        let headers = build_upstream_headers(
            &request.target.api_key,
            request.mode.accept(),
            request.mode.content_type(),
        )
        .map_err(|_| {
            UpstreamError::InvalidRequest("accessKey contains characters not allowed in a header".to_string())
        })?;

        let builder = self
            .client
            .post(&url)
            .headers(headers)
            .timeout(timeout);

        let builder = match request.mode {
            ProxyMode::Json(body) | ProxyMode::Stream(body) | ProxyMode::Binary(body) => {
                builder.json(&body)
            }
            ProxyMode::MultipartUpload(upload) => {
                let form = upload.into_form().map_err(|e| {
                    UpstreamError::InvalidRequest(format!("Invalid audio upload: {}", e))
                })?;
                builder.multipart(form)
            }
        };

        debug!(url = %url, timeout_secs = timeout.as_secs(), "Sending request upstream");

        let response = builder.send().await.map_err(|e| {
            error!(url = %url, error = %error_chain(&e), "Failed to send request upstream");
            if e.is_timeout() {
                UpstreamError::Timeout(timeout)
            } else {
                UpstreamError::Transport(format!("Failed to reach {}: {}", url, error_chain(&e)))
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();

        if !status.is_success() {
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(
                        url = %url,
                        status = %status,
                        error = %error_chain(&e),
                        "Failed to read upstream error body, relaying status only"
                    );
                    Bytes::new()
                }
            };
            debug!(url = %url, status = %status, body_len = body.len(), "Upstream returned an error status");
            return Err(UpstreamError::Status {
                status,
                headers,
                body,
            });
        }

        let body = response
            .bytes_stream()
            .map_err(|e| -> BoxError { Box::new(e) });

        Ok(UpstreamResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}

/// Render an error with its source chain, which reqwest keeps out of Display.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
