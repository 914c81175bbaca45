use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

// Custom API response type that implements IntoResponse
pub struct ApiResponse {
    status: StatusCode,
    body: Json<serde_json::Value>,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, self.body).into_response()
    }
}

// Helper to build a consistent API response
pub fn build_api_response<T: serde::Serialize>(
    status: StatusCode,
    data: Option<T>,
    error: Option<String>,
) -> ApiResponse {
    let success = error.is_none();

    let response = json!({
        "success": success,
        "data": data,
        "error": error,
    });

    ApiResponse {
        status,
        body: Json(response),
    }
}

// Helper to build error responses
pub fn build_error_response(status: StatusCode, error: &str) -> ApiResponse {
    build_api_response::<()>(status, None, Some(error.to_string()))
}

// Helper to build success responses
pub fn build_success_response<T: serde::Serialize>(data: T) -> ApiResponse {
    build_api_response(StatusCode::OK, Some(data), None)
}

// Client key used for rate limiting: first X-Forwarded-For entry
pub fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|first| first.trim().to_string())
        .filter(|first| !first.is_empty())
}

// Current time as RFC 3339 with millisecond precision, e.g. 2024-01-01T00:00:00.000Z
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
