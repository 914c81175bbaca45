use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::{GatewayConfig, ProgramIds};
use crate::programs::ProgramRpc;
use crate::rate_limit::RateLimiter;
use crate::telemetry::GatewayMetrics;

pub const GATEWAY_NAME: &str = "P2P Energy Trading API Gateway";
pub const PLATFORM_GATEWAY_NAME: &str = "P2P Energy Trading Platform API Gateway";

// Main application state
pub struct AppState {
    pub config: GatewayConfig,
    pub http_client: reqwest::Client,
    pub rpc: ProgramRpc,
    pub rate_limiter: RateLimiter,
    pub metrics: GatewayMetrics,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: GatewayConfig, program_ids: ProgramIds) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.proxy_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let rpc = ProgramRpc::with_timeout(
            config.solana_rpc_url.clone(),
            program_ids,
            config.status_probe_timeout,
        );
        let rate_limiter = RateLimiter::new(config.rate_limit_window, config.rate_limit_max);

        Ok(Self {
            config,
            http_client,
            rpc,
            rate_limiter,
            metrics: GatewayMetrics::new(),
            started_at: Instant::now(),
        })
    }
}

// Endpoint listing for GET /
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Endpoints {
    pub health: String,
    pub status: String,
    pub metrics: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct IndexResponse {
    pub message: String,
    pub version: String,
    pub endpoints: Endpoints,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LivenessResponse {
    pub status: String,
    pub timestamp: String,
}

// One dependency checked by GET /health/ready
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DependencyHealth {
    pub name: String,
    pub status: ServiceAvailability,
    pub response_time_ms: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub timestamp: String,
    pub dependencies: Vec<DependencyHealth>,
}

// Service availability as reported by /api/status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceAvailability {
    Available,
    Unavailable,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ServicesStatus {
    pub postgres: ServiceAvailability,
    pub timescaledb: ServiceAvailability,
    pub redis: ServiceAvailability,
    pub kafka: ServiceAvailability,
    pub solana_rpc: ServiceAvailability,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatusResponse {
    pub message: String,
    pub version: String,
    pub environment: String,
    pub timestamp: String,
    pub services: ServicesStatus,
    pub programs: BTreeMap<String, String>,
}
