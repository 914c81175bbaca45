use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::api;
use crate::middleware::{
    handle_panic, rate_limit, record_metrics, request_context, security_headers,
};
use crate::models::AppState;

// Build the gateway router with its full middleware stack
pub fn build_router(state: Arc<AppState>) -> Router {
    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/", get(api::index))
        .route("/health", get(api::health_check))
        .route("/health/live", get(api::liveness_check))
        .route("/health/ready", get(api::readiness_check))
        .route("/api/status", get(api::api_status))
        .route("/metrics", get(api::metrics))
        .route(api::METRICS_PREFIX, any(api::proxy_metrics))
        .route("/api/metrics/", any(api::proxy_metrics))
        .route("/api/metrics/*rest", any(api::proxy_metrics));

    if state.config.blockchain_backend_url.is_some() {
        router = router
            .route(api::BLOCKCHAIN_PREFIX, any(api::proxy_blockchain))
            .route("/api/blockchain/", any(api::proxy_blockchain))
            .route("/api/blockchain/*rest", any(api::proxy_blockchain));
    }

    // Outermost first
    let layers = ServiceBuilder::new()
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(request_context))
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(middleware::from_fn_with_state(state.clone(), record_metrics));

    router.fallback(api::not_found).layer(layers).with_state(state)
}
