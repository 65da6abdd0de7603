//! Rate limiting middleware
//!
//! Per-user request quota on the proxy routes, kept in process with a
//! `governor` keyed limiter (GCRA). Limits apply per user ID taken from the
//! verified token, so the middleware must run after authentication.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use governor::{clock::Clock, clock::DefaultClock, DefaultKeyedRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use tokio::task::JoinHandle;

use crate::{error::AppError, middleware::auth::AuthenticatedUser, AppState};

pub type UserRateLimiter = DefaultKeyedRateLimiter<String>;

const DEFAULT_PER_MINUTE: NonZeroU32 = nonzero!(60u32);

/// Quota for a configured per-minute limit; zero falls back to the default.
pub fn effective_quota(per_minute: u32) -> (u32, Quota) {
    let per_minute = NonZeroU32::new(per_minute).unwrap_or(DEFAULT_PER_MINUTE);
    (per_minute.get(), Quota::per_minute(per_minute))
}

pub fn build_rate_limiter(per_minute: u32) -> UserRateLimiter {
    let (_, quota) = effective_quota(per_minute);
    RateLimiter::keyed(quota)
}

/// Drop keys whose quota has fully replenished.
///
/// The keyed store otherwise keeps one entry per user ID ever seen.
pub fn prune_rate_limiter(limiter: &UserRateLimiter) {
    let before = limiter.len();
    limiter.retain_recent();
    limiter.shrink_to_fit();
    tracing::debug!(
        before = before,
        after = limiter.len(),
        "Pruned idle rate limit keys"
    );
}

/// Prune the limiter on a fixed interval for the life of the process.
pub fn spawn_rate_limiter_pruning(
    limiter: Arc<UserRateLimiter>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            prune_rate_limiter(&limiter);
        }
    })
}

/// Rate limiting middleware
///
/// Returns 429 with `Retry-After` once a user exhausts the quota. Allowed
/// responses carry `x-ratelimit-limit`.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.id.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let (limit, _) = effective_quota(state.config.rate_limit_per_minute);

    if let Err(not_until) = state.rate_limiter.check_key(&user_id) {
        let wait = not_until.wait_time_from(DefaultClock::default().now());
        let retry_after_secs = wait.as_secs().max(1);
        tracing::warn!(
            user_id = %user_id,
            limit = limit,
            retry_after_secs = retry_after_secs,
            "Rate limit exceeded"
        );
        return Err(AppError::RateLimited {
            limit,
            retry_after_secs,
        });
    }

    let mut response = next.run(request).await;
    response.headers_mut().insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(limit),
    );

    Ok(response)
}
