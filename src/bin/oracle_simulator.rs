use tracing::{error, info};

use energy_trading_platform::config::{self, OracleSimulatorConfig};
use energy_trading_platform::simulator::{OracleSimulator, ShellScriptRunner};
use energy_trading_platform::telemetry;

#[tokio::main]
async fn main() {
    // Load environment variables
    config::load_dotenv();

    // Initialize JSON logging
    telemetry::init_json_tracing(telemetry::DEFAULT_LOG_FILTER);

    let simulator_config = match OracleSimulatorConfig::from_env() {
        Ok(simulator_config) => simulator_config,
        Err(err) => {
            error!("Invalid oracle simulator configuration: {:#}", err);
            std::process::exit(1);
        }
    };

    info!(
        substrate_ws_url = %simulator_config.substrate_ws_url,
        kafka_bootstrap_servers = %simulator_config.kafka_bootstrap_servers,
        script = %simulator_config.script_path.display(),
        "Starting Oracle Simulator"
    );

    let runner = ShellScriptRunner::from_config(&simulator_config);
    let mut simulator = OracleSimulator::new(simulator_config, runner);

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    match simulator.run_until(shutdown).await {
        Ok(stats) => info!(
            cycles = stats.cycles,
            clearings_ok = stats.clearings_ok,
            clearings_failed = stats.clearings_failed,
            status_ok = stats.status_ok,
            status_failed = stats.status_failed,
            "Oracle Simulator stopped"
        ),
        Err(err) => {
            error!("Failed to start Oracle Simulator: {:#}", err);
            std::process::exit(1);
        }
    }
}
