use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::error::AppError;
use crate::state::RateLimitConfig;

/// Per-IP fixed window. Redis being unreachable lets the request through.
pub async fn rate_limit_middleware(
    State(config): State<RateLimitConfig>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let key = format!("ratelimit:{}", ip);

    match config.redis.check_rate_limit(&key, config.limit, config.window_seconds).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => {
            tracing::warn!(%ip, "rate limit exceeded");
            Err(AppError::RateLimited)
        }
        Err(err) => {
            tracing::warn!(error = %err, "rate limiter unavailable, failing open");
            Ok(next.run(req).await)
        }
    }
}
