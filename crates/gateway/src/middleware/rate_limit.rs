//! Global rate limiting using a token bucket

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use sitechat_common::{config::RateLimitConfig, errors::AppError};
use std::num::NonZeroU32;
use std::sync::Arc;

pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Limiter plus the configured rate, for error reporting
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<GlobalRateLimiter>,
    requests_per_second: u32,
}

impl RateLimit {
    pub fn new(requests_per_second: u32, burst: u32) -> Result<Self, AppError> {
        let non_zero = |value: u32, key: &str| {
            NonZeroU32::new(value).ok_or_else(|| AppError::Configuration {
                message: format!("rate_limit.{} must be greater than zero", key),
            })
        };

        let quota = Quota::per_second(non_zero(requests_per_second, "requests_per_second")?)
            .allow_burst(non_zero(burst, "burst")?);

        Ok(Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            requests_per_second,
        })
    }

    /// `None` when rate limiting is switched off
    pub fn from_config(config: &RateLimitConfig) -> Result<Option<Self>, AppError> {
        if !config.enabled {
            return Ok(None);
        }
        Self::new(config.requests_per_second, config.burst).map(Some)
    }
}

pub async fn rate_limit_middleware(
    State(limit): State<RateLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match limit.limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
            Err(AppError::RateLimited {
                limit: limit.requests_per_second,
            })
        }
    }
}
