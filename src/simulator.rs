use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::config::OracleSimulatorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptCommand {
    Setup,
    ClearMarket,
    Status,
}

impl ScriptCommand {
    pub fn as_arg(&self) -> &'static str {
        match self {
            ScriptCommand::Setup => "setup",
            ScriptCommand::ClearMarket => "clear-market",
            ScriptCommand::Status => "status",
        }
    }
}

impl fmt::Display for ScriptCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

// Runs one contract interaction command and returns its stdout.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, command: ScriptCommand) -> Result<String>;
}

// Runs the interaction shell script as a child process.
pub struct ShellScriptRunner {
    script_path: PathBuf,
    env: Vec<(&'static str, String)>,
}

impl ShellScriptRunner {
    pub fn new(script_path: impl Into<PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
            env: Vec::new(),
        }
    }

    // The script reads the same connection settings as the simulator
    pub fn from_config(config: &OracleSimulatorConfig) -> Self {
        Self {
            script_path: config.script_path.clone(),
            env: vec![
                ("SUBSTRATE_WS_URL", config.substrate_ws_url.clone()),
                ("KAFKA_BOOTSTRAP_SERVERS", config.kafka_bootstrap_servers.clone()),
                ("ORACLE_ACCOUNT_SEED", config.oracle_account_seed.clone()),
            ],
        }
    }
}

#[async_trait]
impl ScriptRunner for ShellScriptRunner {
    async fn run(&self, command: ScriptCommand) -> Result<String> {
        let output = Command::new(&self.script_path)
            .arg(command.as_arg())
            .envs(self.env.iter().map(|(key, value)| (*key, value.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {} {}", self.script_path.display(), command))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let code = output
            .status
            .code()
            .map(|code| code.to_string())
            .unwrap_or_else(|| "signal".to_string());
        Err(anyhow!(
            "Script failed with code {}: {}",
            code,
            String::from_utf8_lossy(&output.stderr).trim()
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ContractEntry {
    address: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DeployedContracts {
    registry: ContractEntry,
    grid_token: ContractEntry,
    trading: ContractEntry,
    oracle_client: ContractEntry,
}

#[derive(Debug, Clone, Deserialize)]
struct DeploymentSummary {
    contracts: DeployedContracts,
}

#[derive(Debug, Clone, Deserialize)]
struct DeploymentSummaryFile {
    deployment_summary: DeploymentSummary,
}

// Addresses of the deployed contracts the simulator drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractAddresses {
    pub registry: String,
    pub grid_token: String,
    pub trading: String,
    pub oracle_client: String,
}

impl ContractAddresses {
    pub fn from_summary_json(raw: &str) -> Result<Self> {
        let file: DeploymentSummaryFile =
            serde_json::from_str(raw).context("Malformed deployment summary")?;
        let contracts = file.deployment_summary.contracts;

        Ok(Self {
            registry: contracts.registry.address,
            grid_token: contracts.grid_token.address,
            trading: contracts.trading.address,
            oracle_client: contracts.oracle_client.address,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    pub cycles: u64,
    pub clearings_ok: u64,
    pub clearings_failed: u64,
    pub status_ok: u64,
    pub status_failed: u64,
}

pub struct OracleSimulator<R: ScriptRunner> {
    config: OracleSimulatorConfig,
    runner: R,
    contract_addresses: Option<ContractAddresses>,
    setup_complete: bool,
    stats: CycleStats,
}

impl<R: ScriptRunner> OracleSimulator<R> {
    pub fn new(config: OracleSimulatorConfig, runner: R) -> Self {
        Self {
            config,
            runner,
            contract_addresses: None,
            setup_complete: false,
            stats: CycleStats::default(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn contract_addresses(&self) -> Option<&ContractAddresses> {
        self.contract_addresses.as_ref()
    }

    pub fn setup_complete(&self) -> bool {
        self.setup_complete
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    pub async fn wait_for_contracts(&self) {
        info!("Waiting for contract deployment to complete...");
        let summary_path = self.config.deployment_summary_path();

        while !tokio::fs::try_exists(&summary_path).await.unwrap_or(false) {
            info!(path = %summary_path.display(), "Waiting for contracts to be deployed...");
            tokio::time::sleep(self.config.deployment_poll_interval).await;
        }

        info!("Contracts are deployed and ready");
    }

    pub async fn load_contract_addresses(&mut self) -> Result<&ContractAddresses> {
        let summary_path = self.config.deployment_summary_path();
        let raw = tokio::fs::read_to_string(&summary_path)
            .await
            .with_context(|| format!("Failed to read {}", summary_path.display()))?;
        let addresses = ContractAddresses::from_summary_json(&raw)?;

        info!(
            registry = %addresses.registry,
            grid_token = %addresses.grid_token,
            trading = %addresses.trading,
            oracle_client = %addresses.oracle_client,
            "Contract addresses loaded"
        );

        Ok(&*self.contract_addresses.insert(addresses))
    }

    // Runs once; a failure leaves the simulator usable without demo data
    pub async fn setup_demo_data(&mut self) {
        if self.setup_complete {
            info!("Demo data already setup, skipping...");
            return;
        }

        info!("Setting up demo data...");
        match self.runner.run(ScriptCommand::Setup).await {
            Ok(_) => {
                info!("Demo data setup completed");
                self.setup_complete = true;
            }
            Err(err) => error!("Failed to setup demo data: {:#}", err),
        }
    }

    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing Oracle Simulator...");

        self.wait_for_contracts().await;
        if let Err(err) = self.load_contract_addresses().await {
            error!("Failed to load contract addresses: {:#}", err);
            return Err(err);
        }
        self.setup_demo_data().await;

        info!("Oracle Simulator initialized successfully");
        Ok(())
    }

    pub async fn execute_market_clearing(&mut self) -> bool {
        info!("Executing market clearing...");
        match self.runner.run(ScriptCommand::ClearMarket).await {
            Ok(_) => {
                info!("Market clearing executed successfully");
                self.stats.clearings_ok += 1;
                true
            }
            Err(err) => {
                error!("Failed to execute market clearing: {:#}", err);
                self.stats.clearings_failed += 1;
                false
            }
        }
    }

    pub async fn check_system_status(&mut self) -> bool {
        info!("Checking system status...");
        match self.runner.run(ScriptCommand::Status).await {
            Ok(_) => {
                info!("System status checked successfully");
                self.stats.status_ok += 1;
                true
            }
            Err(err) => {
                error!("Failed to check system status: {:#}", err);
                self.stats.status_failed += 1;
                false
            }
        }
    }

    // Initial clearing, then clearing and status every interval until shutdown
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<CycleStats>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tokio::select! {
            result = self.initialize() => result?,
            _ = &mut shutdown => {
                info!("Shutdown requested during initialization");
                return Ok(self.stats);
            }
        }

        let period = self.config.processing_interval;
        let first_tick = Instant::now()
            .checked_add(period)
            .ok_or_else(|| anyhow!("Processing interval {:?} is out of range", period))?;
        info!("Oracle Simulator is running with {}s intervals", period.as_secs());

        self.execute_market_clearing().await;

        let mut ticker = interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Received shutdown signal, gracefully shutting down...");
                    break;
                }
                _ = ticker.tick() => {
                    info!("Periodic market clearing started");
                    self.stats.cycles += 1;
                    self.execute_market_clearing().await;
                    self.check_system_status().await;
                }
            }
        }

        Ok(self.stats)
    }
}
