//! Configuration management for the proxy
//!
//! Configuration is loaded from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Provider domain that gated capabilities (ASR, TTS, video) must target
pub const DEFAULT_GATED_PROVIDER_DOMAIN: &str = "siliconflow.cn";

/// Default request body ceiling for the transcription route (25 MiB)
pub const DEFAULT_MAX_AUDIO_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Shared secret used to verify HS256 bearer tokens
    pub jwt_secret: String,

    /// Timeout for JSON request/response exchanges (in seconds)
    pub json_timeout_seconds: u64,
    /// Timeout for audio uploads and speech synthesis (in seconds)
    pub audio_timeout_seconds: u64,
    /// Upper bound on a relayed stream's lifetime (in seconds)
    pub stream_timeout_seconds: u64,

    /// Largest request body accepted by the transcription route (base64 audio inflates by a third)
    pub max_audio_upload_bytes: usize,

    /// Domain required by provider-gated capabilities
    pub gated_provider_domain: String,

    /// Proxy requests allowed per user per minute
    pub rate_limit_per_minute: u32,

    /// Key protecting the documentation endpoints (open when unset)
    pub docs_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .context("Invalid PORT")?,

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,

            json_timeout_seconds: env::var("PROXY_JSON_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid PROXY_JSON_TIMEOUT_SECONDS")?,
            audio_timeout_seconds: env::var("PROXY_AUDIO_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid PROXY_AUDIO_TIMEOUT_SECONDS")?,
            stream_timeout_seconds: env::var("PROXY_STREAM_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("Invalid PROXY_STREAM_TIMEOUT_SECONDS")?,

            max_audio_upload_bytes: match env::var("MAX_AUDIO_UPLOAD_BYTES") {
                Ok(raw) => raw.parse().context("Invalid MAX_AUDIO_UPLOAD_BYTES")?,
                Err(_) => DEFAULT_MAX_AUDIO_UPLOAD_BYTES,
            },

            gated_provider_domain: env::var("GATED_PROVIDER_DOMAIN")
                .unwrap_or_else(|_| DEFAULT_GATED_PROVIDER_DOMAIN.to_string())
                .trim()
                .to_ascii_lowercase(),

            rate_limit_per_minute: env::var("RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid RATE_LIMIT_PER_MINUTE")?,

            docs_api_key: env::var("DOCS_API_KEY").ok().filter(|key| !key.is_empty()),
        })
    }

    pub fn json_timeout(&self) -> Duration {
        Duration::from_secs(self.json_timeout_seconds)
    }

    pub fn audio_timeout(&self) -> Duration {
        Duration::from_secs(self.audio_timeout_seconds)
    }

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_seconds)
    }
}
