use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::models::AppState;
use crate::utils;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const UNMATCHED_ROUTE: &str = "unmatched";

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

// Reuse the caller's request id or mint one, log one access line per request
pub async fn request_context(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let request_id_value = HeaderValue::from_str(&request_id).ok();

    if let Some(value) = &request_id_value {
        req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let method = req.method().clone();
    let uri = req.uri().clone();
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let span = info_span!(
        "request",
        method = %method,
        path = %uri.path(),
        request_id = %request_id
    );
    let started = Instant::now();

    let mut response = next.run(req).instrument(span.clone()).await;

    if let Some(value) = request_id_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    span.in_scope(|| {
        info!(
            status = response.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            user_agent = %user_agent,
            "{} {}",
            method,
            uri
        );
    });

    response
}

pub async fn security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=15552000; includeSubDomains"),
    );
    headers.insert(header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off"));
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

// Peer address first, then the proxy-supplied client address
fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .or_else(|| utils::forwarded_for(req.headers()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let key = client_key(&req);
    let decision = state.rate_limiter.check(&key);

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        warn!("Rate limit exceeded for {}", key);
        state.metrics.record_rate_limited();

        let mut rejected = utils::build_error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests, please try again later.",
        )
        .into_response();
        rejected
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(decision.reset_secs()));
        rejected
    };

    let headers = response.headers_mut();
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(decision.reset_secs()));

    response
}

pub async fn record_metrics(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());
    let method = req.method().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    state
        .metrics
        .record_request(&method, &route, response.status().as_u16(), started.elapsed());
    response
}

// Panics inside handlers become the generic 500 envelope
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!("Handler panicked: {}", detail);

    utils::build_error_response(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong!")
        .into_response()
}
