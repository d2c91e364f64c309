// Per-IP rate limiting middleware

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::warn;

use crate::{
    app::AppState,
    services::rate_limit::RateLimitDecision,
    utils::{app_error::AppError, client_ip::resolve_client_ip},
};

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // Absent when the router is driven without a socket, e.g. in tests
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let client_ip = resolve_client_ip(
        request.headers(),
        peer,
        state.config.security.number_of_proxies,
    );

    match state.rate_limiter.check(client_ip) {
        RateLimitDecision::Allowed => next.run(request).await,
        RateLimitDecision::Limited { retry_after } => {
            warn!(
                client_ip = %client_ip,
                path = %request.uri().path(),
                "Rate limit exceeded"
            );
            let mut response = AppError::TooManyRequests.into_response();
            // Round up so clients never retry early
            let seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        },
    }
}
