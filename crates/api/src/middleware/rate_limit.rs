//! Per-client rate limiting for the public POST endpoints.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Extensions, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{clock::Clock, DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};

use crate::app::AppState;
use crate::error::ApiError;

/// Tracked clients above which stale limiter state is dropped.
const PRUNE_THRESHOLD: usize = 10_000;

/// Keyed limiter shared by every request. A limit of 0 disables limiting.
#[derive(Clone)]
pub struct RateLimiterState {
    limiter: Option<Arc<DefaultKeyedRateLimiter<String>>>,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    pub fn new(rate_limit_per_minute: u32) -> Self {
        let limiter = NonZeroU32::new(rate_limit_per_minute)
            .map(|per_minute| Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))));
        Self {
            limiter,
            rate_limit_per_minute,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// `Err(retry_after_secs)` when the client has used up its quota.
    pub fn check(&self, client: &str) -> Result<(), u64> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        if limiter.len() > PRUNE_THRESHOLD {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }

        limiter.check_key(&client.to_string()).map_err(|not_until| {
            let wait = not_until.wait_time_from(governor::clock::DefaultClock::default().now());
            wait.as_secs().max(1)
        })
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field(
                "tracked_clients",
                &self.limiter.as_ref().map(|l| l.len()).unwrap_or(0),
            )
            .finish()
    }
}

/// Identifies the client: first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then the peer address.
pub fn client_key(headers: &HeaderMap, extensions: &Extensions) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(ip) = forwarded.or_else(real_ip) {
        return ip.to_string();
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(req.headers(), req.extensions());

    if let Err(retry_after_secs) = state.rate_limiter.check(&client) {
        tracing::warn!(client = %client, path = %req.uri().path(), "Rate limit exceeded");
        return ApiError::RateLimited { retry_after_secs }.into_response();
    }

    next.run(req).await
}
