use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use energy_trading_platform::config::OracleSimulatorConfig;
use energy_trading_platform::simulator::{
    ContractAddresses, CycleStats, OracleSimulator, ScriptCommand, ScriptRunner,
};

const SUMMARY: &str = r#"{
    "deployment_summary": {
        "contracts": {
            "registry": {"address": "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"},
            "grid_token": {"address": "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty"},
            "trading": {"address": "5FLSigC9HGRKVhB9FiEo4Y3koPsNmBmLJbpXg2mp1hXcS59Y"},
            "oracle_client": {"address": "5DAAnrj7VHTznn2AWBemMuyBwZWs6FNFjdyVXUeYum3PTXFy"}
        }
    }
}"#;

// Records every command and fails the ones it is told to
#[derive(Default)]
struct MockRunner {
    calls: Mutex<Vec<ScriptCommand>>,
    failing: HashSet<ScriptCommand>,
}

impl MockRunner {
    fn failing(commands: &[ScriptCommand]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: commands.iter().copied().collect(),
        }
    }

    fn calls(&self) -> Vec<ScriptCommand> {
        self.calls.lock().clone()
    }

    fn count(&self, command: ScriptCommand) -> usize {
        self.calls.lock().iter().filter(|c| **c == command).count()
    }
}

#[async_trait]
impl ScriptRunner for MockRunner {
    async fn run(&self, command: ScriptCommand) -> Result<String> {
        self.calls.lock().push(command);
        if self.failing.contains(&command) {
            return Err(anyhow!("Script failed with code 1: {} reverted", command));
        }
        Ok(format!("{} ok", command))
    }
}

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("contract-addresses-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config_for(dir: &PathBuf) -> OracleSimulatorConfig {
    OracleSimulatorConfig {
        contract_addresses_path: dir.clone(),
        processing_interval: Duration::from_secs(60),
        deployment_poll_interval: Duration::from_secs(5),
        ..OracleSimulatorConfig::from_lookup(|_| None).unwrap()
    }
}

fn deployed_dir(summary: &str) -> PathBuf {
    let dir = temp_dir();
    std::fs::write(dir.join("deployment_summary.json"), summary).unwrap();
    dir
}

#[tokio::test(start_paused = true)]
async fn waits_until_deployment_summary_appears() {
    let dir = temp_dir();
    let summary_path = dir.join("deployment_summary.json");
    let writer = tokio::spawn(async move {
        sleep(Duration::from_secs(12)).await;
        std::fs::write(summary_path, SUMMARY).unwrap();
    });

    let mut simulator = OracleSimulator::new(config_for(&dir), MockRunner::default());
    let started = Instant::now();
    simulator.initialize().await.unwrap();
    writer.await.unwrap();

    // Polling every 5s finds the file on the check after it was written
    assert!(started.elapsed() >= Duration::from_secs(12));
    assert!(started.elapsed() <= Duration::from_secs(15));

    let addresses = simulator.contract_addresses().unwrap();
    assert_eq!(
        addresses,
        &ContractAddresses {
            registry: "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY".to_string(),
            grid_token: "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty".to_string(),
            trading: "5FLSigC9HGRKVhB9FiEo4Y3koPsNmBmLJbpXg2mp1hXcS59Y".to_string(),
            oracle_client: "5DAAnrj7VHTznn2AWBemMuyBwZWs6FNFjdyVXUeYum3PTXFy".to_string(),
        }
    );
    assert!(simulator.setup_complete());
    assert_eq!(simulator.runner().calls(), vec![ScriptCommand::Setup]);
}

#[tokio::test(start_paused = true)]
async fn malformed_summary_fails_initialization() {
    let dir = deployed_dir(r#"{"deployment_summary": {"contracts": {}}}"#);
    let mut simulator = OracleSimulator::new(config_for(&dir), MockRunner::default());

    let result = simulator.run_until(sleep(Duration::from_secs(600))).await;
    assert!(result.is_err());
    assert!(simulator.contract_addresses().is_none());
    assert!(simulator.runner().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn demo_setup_runs_once() {
    let dir = deployed_dir(SUMMARY);
    let mut simulator = OracleSimulator::new(config_for(&dir), MockRunner::default());

    simulator.initialize().await.unwrap();
    simulator.setup_demo_data().await;
    simulator.setup_demo_data().await;

    assert_eq!(simulator.runner().count(ScriptCommand::Setup), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_setup_does_not_stop_clearing() {
    let dir = deployed_dir(SUMMARY);
    let runner = MockRunner::failing(&[ScriptCommand::Setup]);
    let mut simulator = OracleSimulator::new(config_for(&dir), runner);

    let stats = simulator.run_until(sleep(Duration::from_secs(65))).await.unwrap();

    assert!(!simulator.setup_complete());
    assert_eq!(stats.cycles, 1);
    assert_eq!(stats.clearings_ok, 2);
    assert_eq!(stats.status_ok, 1);
}

#[tokio::test(start_paused = true)]
async fn clears_immediately_then_every_interval() {
    let dir = deployed_dir(SUMMARY);
    let mut simulator = OracleSimulator::new(config_for(&dir), MockRunner::default());

    let stats = simulator.run_until(sleep(Duration::from_secs(185))).await.unwrap();

    assert_eq!(
        stats,
        CycleStats {
            cycles: 3,
            clearings_ok: 4,
            clearings_failed: 0,
            status_ok: 3,
            status_failed: 0,
        }
    );
    assert_eq!(
        simulator.runner().calls(),
        vec![
            ScriptCommand::Setup,
            ScriptCommand::ClearMarket,
            ScriptCommand::ClearMarket,
            ScriptCommand::Status,
            ScriptCommand::ClearMarket,
            ScriptCommand::Status,
            ScriptCommand::ClearMarket,
            ScriptCommand::Status,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_cycles_are_counted_and_loop_continues() {
    let dir = deployed_dir(SUMMARY);
    let runner = MockRunner::failing(&[ScriptCommand::ClearMarket]);
    let mut simulator = OracleSimulator::new(config_for(&dir), runner);

    let stats = simulator.run_until(sleep(Duration::from_secs(125))).await.unwrap();

    assert_eq!(stats.cycles, 2);
    assert_eq!(stats.clearings_ok, 0);
    assert_eq!(stats.clearings_failed, 3);
    assert_eq!(stats.status_ok, 2);
    assert_eq!(simulator.stats(), stats);
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_waiting_for_deployment() {
    let dir = temp_dir();
    let mut simulator = OracleSimulator::new(config_for(&dir), MockRunner::default());

    let stats = simulator.run_until(sleep(Duration::from_secs(30))).await.unwrap();

    assert_eq!(stats, CycleStats::default());
    assert!(simulator.contract_addresses().is_none());
    assert!(simulator.runner().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn out_of_range_interval_is_an_error() {
    let dir = deployed_dir(SUMMARY);
    let config = OracleSimulatorConfig {
        processing_interval: Duration::MAX,
        ..config_for(&dir)
    };
    let mut simulator = OracleSimulator::new(config, MockRunner::default());

    let result = simulator.run_until(sleep(Duration::from_secs(30))).await;

    assert!(result.is_err());
    assert_eq!(simulator.runner().count(ScriptCommand::ClearMarket), 0);
}
