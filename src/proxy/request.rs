//! Outbound proxy request model
//!
//! A [`ProxyRequest`] pairs a capability and provider target with a
//! [`ProxyMode`]. The mode carries the payload and decides how the request is
//! encoded and how the upstream response is relayed back.

use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::proxy::{capability::Capability, target::ProviderTarget};

/// Outbound timeouts per exchange class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    pub json: Duration,
    pub audio: Duration,
    pub stream: Duration,
}

impl UpstreamTimeouts {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            json: config.json_timeout(),
            audio: config.audio_timeout(),
            stream: config.stream_timeout(),
        }
    }
}

impl Default for UpstreamTimeouts {
    fn default() -> Self {
        Self {
            json: Duration::from_secs(30),
            audio: Duration::from_secs(60),
            stream: Duration::from_secs(300),
        }
    }
}

/// Audio file forwarded as a multipart upload
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Bytes,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub model: String,
    /// Extra text fields appended to the form
    pub fields: Vec<(&'static str, String)>,
}

impl AudioUpload {
    pub fn into_form(self) -> reqwest::Result<Form> {
        let mut file_part = Part::bytes(self.bytes.to_vec()).file_name(self.file_name);
        if let Some(mime_type) = self.mime_type.as_deref() {
            file_part = file_part.mime_str(mime_type)?;
        }

        let mut form = Form::new().text("model", self.model).part("file", file_part);
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

/// How the upstream exchange is encoded and relayed
#[derive(Debug, Clone)]
pub enum ProxyMode {
    /// JSON in, parsed JSON relayed back verbatim
    Json(Value),
    /// JSON in, upstream bytes piped back as an event stream
    Stream(Value),
    /// JSON in, raw bytes (audio) relayed back with upstream content headers
    Binary(Value),
    /// Multipart file upload in, JSON relayed back
    MultipartUpload(AudioUpload),
}

impl ProxyMode {
    pub fn accept(&self) -> &'static str {
        match self {
            ProxyMode::Json(_) | ProxyMode::MultipartUpload(_) => "application/json",
            ProxyMode::Stream(_) => "text/event-stream",
            ProxyMode::Binary(_) => "*/*",
        }
    }

    /// `None` for multipart, whose boundary is set by the form encoder
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            ProxyMode::MultipartUpload(_) => None,
            _ => Some("application/json"),
        }
    }

    pub fn timeout(&self, timeouts: &UpstreamTimeouts) -> Duration {
        match self {
            ProxyMode::Json(_) => timeouts.json,
            ProxyMode::Stream(_) => timeouts.stream,
            ProxyMode::Binary(_) | ProxyMode::MultipartUpload(_) => timeouts.audio,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, ProxyMode::Stream(_))
    }

    pub fn relay(&self) -> RelayKind {
        match self {
            ProxyMode::Json(_) | ProxyMode::MultipartUpload(_) => RelayKind::Json,
            ProxyMode::Stream(_) => RelayKind::Stream,
            ProxyMode::Binary(_) => RelayKind::Binary,
        }
    }
}

/// How a successful upstream response is handed back to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    Json,
    Stream,
    Binary,
}

/// A fully validated request, ready for an [`Upstream`](crate::proxy::Upstream)
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub capability: Capability,
    pub target: ProviderTarget,
    pub mode: ProxyMode,
}

impl ProxyRequest {
    pub fn new(capability: Capability, target: ProviderTarget, mode: ProxyMode) -> Self {
        Self {
            capability,
            target,
            mode,
        }
    }

    pub fn url(&self) -> String {
        self.target.endpoint(self.capability.path())
    }
}
