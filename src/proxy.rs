use axum::{
    body::{self, Body},
    extract::Request,
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use crate::models::AppState;
use crate::utils;

pub const MAX_PROXY_BODY_BYTES: usize = 10 * 1024 * 1024;

// Connection-scoped headers that must not be forwarded in either direction
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    let name = name.as_str();
    HOP_BY_HOP.contains(&name) || name.starts_with("proxy-")
}

// Copy end-to-end headers; the body length is recomputed on each side
fn end_to_end_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || name == header::HOST || name == header::CONTENT_LENGTH {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

// Prefix stripped, empty remainder becomes `/`, query kept
pub fn upstream_url(base: &str, prefix: &str, path: &str, query: Option<&str>) -> String {
    let rest = path.strip_prefix(prefix).unwrap_or(path);
    let rest = if rest.is_empty() { "/" } else { rest };

    let mut url = format!("{}{}", base.trim_end_matches('/'), rest);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

fn body_too_large() -> Response {
    utils::build_error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
        .into_response()
}

fn backend_unavailable(name: &str) -> Response {
    utils::build_error_response(StatusCode::BAD_GATEWAY, &format!("{} unavailable", name))
        .into_response()
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

// `name` labels the backend in the 502 message
pub async fn forward(
    state: &AppState,
    base: &str,
    prefix: &str,
    name: &str,
    req: Request,
) -> Response {
    let (parts, req_body) = req.into_parts();

    if declared_length(&parts.headers).map_or(false, |len| len > MAX_PROXY_BODY_BYTES) {
        return body_too_large();
    }

    let bytes = match body::to_bytes(req_body, MAX_PROXY_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!("Rejecting proxied request body: {}", err);
            return body_too_large();
        }
    };

    let url = upstream_url(base, prefix, parts.uri.path(), parts.uri.query());
    debug!("Proxying {} {} -> {}", parts.method, parts.uri, url);

    let upstream = state
        .http_client
        .request(parts.method.clone(), &url)
        .headers(end_to_end_headers(&parts.headers))
        .body(bytes)
        .send()
        .await;

    let upstream = match upstream {
        Ok(upstream) => upstream,
        Err(err) => {
            error!("{} request to {} failed: {}", name, url, err);
            return backend_unavailable(name);
        }
    };

    let status = upstream.status();
    let headers = end_to_end_headers(upstream.headers());

    let payload = match upstream.bytes().await {
        Ok(payload) => payload,
        Err(err) => {
            error!("Failed to read {} response from {}: {}", name, url, err);
            return backend_unavailable(name);
        }
    };

    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
