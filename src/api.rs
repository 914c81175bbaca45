use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::models::{
    AppState, DependencyHealth, Endpoints, HealthResponse, IndexResponse, LivenessResponse,
    ReadinessResponse, ServiceAvailability, ServicesStatus, StatusResponse, GATEWAY_NAME,
    PLATFORM_GATEWAY_NAME,
};
use crate::proxy;
use crate::utils;

pub const METRICS_PREFIX: &str = "/api/metrics";
pub const BLOCKCHAIN_PREFIX: &str = "/api/blockchain";

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

// Handler for the service index
pub async fn index() -> impl IntoResponse {
    Json(IndexResponse {
        message: PLATFORM_GATEWAY_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: Endpoints {
            health: "/health".to_string(),
            status: "/api/status".to_string(),
            metrics: METRICS_PREFIX.to_string(),
        },
    })
}

// Handler for health check
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: utils::timestamp_now(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

// Liveness: the process is up and serving requests
pub async fn liveness_check() -> impl IntoResponse {
    Json(LivenessResponse {
        status: "alive".to_string(),
        timestamp: utils::timestamp_now(),
    })
}

// Readiness: 503 until every dependency answers
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Response {
    let started = Instant::now();
    let solana_rpc = probe_solana_rpc(&state).await;

    let report = ReadinessResponse {
        ready: solana_rpc == ServiceAvailability::Available,
        timestamp: utils::timestamp_now(),
        dependencies: vec![DependencyHealth {
            name: "solana_rpc".to_string(),
            status: solana_rpc,
            response_time_ms: started.elapsed().as_millis() as u64,
        }],
    };

    if report.ready {
        utils::build_success_response(report).into_response()
    } else {
        utils::build_api_response(
            StatusCode::SERVICE_UNAVAILABLE,
            Some(report),
            Some("Service not ready".to_string()),
        )
        .into_response()
    }
}

// Probe the Solana RPC endpoint; any failure or timeout counts as unavailable
async fn probe_solana_rpc(state: &AppState) -> ServiceAvailability {
    match tokio::time::timeout(state.config.status_probe_timeout, state.rpc.version()).await {
        Ok(Ok(version)) => {
            info!("Solana RPC reachable (solana-core {})", version);
            ServiceAvailability::Available
        }
        Ok(Err(err)) => {
            warn!("Solana RPC probe failed: {}", err);
            ServiceAvailability::Unavailable
        }
        Err(_) => {
            warn!("Solana RPC probe timed out after {:?}", state.config.status_probe_timeout);
            ServiceAvailability::Unavailable
        }
    }
}

// Handler for the gateway status report
pub async fn api_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let solana_rpc = probe_solana_rpc(&state).await;

    let programs = state
        .rpc
        .program_ids()
        .entries()
        .into_iter()
        .map(|(name, id)| (name.to_string(), id.to_string()))
        .collect();

    Json(StatusResponse {
        message: GATEWAY_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        timestamp: utils::timestamp_now(),
        services: ServicesStatus {
            postgres: ServiceAvailability::Available,
            timescaledb: ServiceAvailability::Available,
            redis: ServiceAvailability::Available,
            kafka: ServiceAvailability::Available,
            solana_rpc,
        },
        programs,
    })
}

// Handler for the gateway's own Prometheus metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}

// Handler for /api/metrics and everything below it
pub async fn proxy_metrics(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let base = state.config.metrics_backend_url.clone();
    proxy::forward(&state, &base, METRICS_PREFIX, "Metrics backend", req).await
}

// Handler for /api/blockchain; only routed when a backend is configured
pub async fn proxy_blockchain(State(state): State<Arc<AppState>>, req: Request) -> Response {
    match state.config.blockchain_backend_url.clone() {
        Some(base) => {
            proxy::forward(&state, &base, BLOCKCHAIN_PREFIX, "Blockchain backend", req).await
        }
        None => not_found().await.into_response(),
    }
}

// Fallback for unknown routes
pub async fn not_found() -> impl IntoResponse {
    utils::build_error_response(StatusCode::NOT_FOUND, "Route not found")
}
