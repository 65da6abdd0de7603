//! Request logging for proxied provider calls
//!
//! Each proxied request carries a short correlation ID so the inbound call,
//! the upstream call and the end of a relayed stream can be matched in logs.
//! Provider keys and request bodies are never logged.

use std::time::Instant;
use tracing::{debug, error, info, warn, Span};
use uuid::Uuid;

use crate::proxy::capability::Capability;

/// Context for tracking one proxied request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (for log correlation)
    pub trace_id: String,
    pub start_time: Instant,
    pub capability: Capability,
    pub model: Option<String>,
    pub streaming: bool,
    /// Caller's user ID from the verified token
    pub user_id: Option<String>,
}

impl RequestContext {
    pub fn new(capability: Capability) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(),
            start_time: Instant::now(),
            capability,
            model: None,
            streaming: false,
            user_id: None,
        }
    }

    pub fn with_model(mut self, model: Option<impl Into<String>>) -> Self {
        self.model = model.map(Into::into);
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    pub fn log_request_start(&self) {
        info!(
            trace_id = %self.trace_id,
            capability = %self.capability,
            model = ?self.model,
            streaming = %self.streaming,
            user_id = ?self.user_id,
            "Proxy request started"
        );
    }

    /// Log the outbound call. Only the host is logged, never the key.
    pub fn log_upstream_request(&self, url: &str) {
        let host = reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        debug!(
            trace_id = %self.trace_id,
            capability = %self.capability,
            upstream_host = %host,
            elapsed_ms = %self.elapsed_ms(),
            "Sending request to upstream"
        );
    }

    pub fn log_upstream_response(&self, status: u16) {
        info!(
            trace_id = %self.trace_id,
            capability = %self.capability,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    pub fn log_stream_started(&self) {
        info!(
            trace_id = %self.trace_id,
            capability = %self.capability,
            elapsed_ms = %self.elapsed_ms(),
            "Streaming response started"
        );
    }

    pub fn log_stream_ended(&self, chunks: usize, events: usize, saw_done: bool) {
        info!(
            trace_id = %self.trace_id,
            capability = %self.capability,
            model = ?self.model,
            chunks = %chunks,
            events = %events,
            saw_done = %saw_done,
            elapsed_ms = %self.elapsed_ms(),
            "Streaming response ended"
        );
    }

    /// The client went away before the stream finished.
    pub fn log_client_disconnect(&self, chunks: usize) {
        warn!(
            trace_id = %self.trace_id,
            capability = %self.capability,
            chunks = %chunks,
            elapsed_ms = %self.elapsed_ms(),
            "Client disconnected, upstream stream cancelled"
        );
    }

    pub fn log_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            capability = %self.capability,
            model = ?self.model,
            streaming = %self.streaming,
            elapsed_ms = %self.elapsed_ms(),
            user_id = ?self.user_id,
            error = %error,
            "Proxy request failed"
        );
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "proxy_request",
            trace_id = %self.trace_id,
            capability = %self.capability,
            model = ?self.model,
            streaming = %self.streaming,
        )
    }
}
