//! ModelHub proxy - authenticated pass-through to third-party model providers
//!
//! Callers supply the provider URL and key with each request. The service
//! cleans and validates them, forwards the request, and relays the provider's
//! answer (JSON, raw audio, or an event stream) or a normalized error.

pub mod config;
pub mod docs;
pub mod error;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod streaming;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

pub use crate::config::Config;
pub use crate::proxy::{HttpUpstream, Upstream};

use crate::middleware::rate_limiter::{build_rate_limiter, UserRateLimiter};
use crate::proxy::UpstreamTimeouts;

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// Client for provider calls
    pub upstream: Arc<dyn Upstream>,
    pub rate_limiter: Arc<UserRateLimiter>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // Per-request timeouts come from the proxy mode, so the client has none.
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let upstream: Arc<dyn Upstream> = Arc::new(HttpUpstream::new(
            http_client,
            UpstreamTimeouts::from_config(&config),
        ));

        Ok(Self::with_upstream(config, upstream))
    }

    /// Create application state around a given upstream
    pub fn with_upstream(config: Config, upstream: Arc<dyn Upstream>) -> Self {
        let rate_limiter = Arc::new(build_rate_limiter(config.rate_limit_per_minute));

        Self {
            config,
            start_time: Instant::now(),
            upstream,
            rate_limiter,
        }
    }
}
