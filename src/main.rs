use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use energy_trading_platform::config::{self, GatewayConfig, ProgramIds};
use energy_trading_platform::telemetry;
use energy_trading_platform::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    config::load_dotenv();

    // Initialize tracing
    telemetry::init_tracing(telemetry::DEFAULT_LOG_FILTER);

    let gateway_config = GatewayConfig::from_env()?;
    let program_ids = ProgramIds::from_env()?;
    let bind_address = gateway_config.bind_address();
    let environment = gateway_config.environment.clone();

    // Initialize application state
    let app_state = Arc::new(AppState::new(gateway_config, program_ids)?);
    let app = build_router(app_state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!("API Gateway running on {}", listener.local_addr()?);
    info!("Environment: {}", environment);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("API Gateway stopped");
    Ok(())
}

// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
