//! # Middleware Module
//!
//! Rate limiting for the Rational Onion HTTP API.
//!
//! ## Configuration
//!
//! The limit comes from `Settings::rate_limit` (`ONION_RATE_LIMIT`), written
//! as `N/second`, `N/minute` or `N/hour`. `off` disables it.

use super::error::ApiError;
use crate::settings::{RateLimit, RatePeriod};
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::sync::Arc;

// =============================================================================
// RATE LIMITER
// =============================================================================

/// Global rate limiter plus the limit it enforces.
#[derive(Clone)]
pub struct GlobalRateLimiter {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    limit: RateLimit,
}

impl GlobalRateLimiter {
    /// The limit this limiter enforces.
    #[must_use]
    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Take one request slot, `false` when the limit is exhausted.
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

/// Create a new global rate limiter.
#[must_use]
pub fn create_rate_limiter(limit: RateLimit) -> GlobalRateLimiter {
    let quota = match limit.period {
        RatePeriod::Second => Quota::per_second(limit.requests),
        RatePeriod::Minute => Quota::per_minute(limit.requests),
        RatePeriod::Hour => Quota::per_hour(limit.requests),
    };
    GlobalRateLimiter {
        limiter: Arc::new(RateLimiter::direct(quota)),
        limit,
    }
}

/// Rate limiting middleware.
///
/// Checks the global rate limiter before allowing requests through.
/// Returns 429 with a `rate_limit_error` body if the limit is exceeded.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if limiter.check() {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(
            event = "rate_limited",
            limit = %limiter.limit(),
            path = request.uri().path(),
            "Rate limit exceeded"
        );
        Err(ApiError::rate_limited(&limiter.limit().to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
