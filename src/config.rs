use anyhow::{anyhow, Context, Result};
use solana_sdk::pubkey::Pubkey;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::programs::{dapp, energy_token, governance, oracle, registry, trading};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PROCESSING_INTERVAL_SECS: u64 = 60;
const MAX_PROCESSING_INTERVAL_SECS: u64 = 24 * 60 * 60;

// Load the .env file (if any) before reading the environment
pub fn load_dotenv() {
    dotenv::dotenv().ok();
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

// First non-empty value among several keys
fn first_of<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter().find_map(|key| lookup(key))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid value for {}: {:?} ({})", key, raw, e)),
        None => Ok(default),
    }
}

// Settings for the HTTP gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub metrics_backend_url: String,
    pub blockchain_backend_url: Option<String>,
    pub solana_rpc_url: String,
    pub rate_limit_window: Duration,
    pub rate_limit_max: u32,
    pub proxy_timeout: Duration,
    pub status_probe_timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match first_of(&lookup, &["API_PORT", "PORT"]) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid port: {:?}", raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            environment: first_of(&lookup, &["ENVIRONMENT", "NODE_ENV"])
                .unwrap_or_else(|| "development".to_string()),
            metrics_backend_url: lookup("METRICS_BACKEND_URL")
                .unwrap_or_else(|| "http://prometheus:9090".to_string()),
            blockchain_backend_url: lookup("BLOCKCHAIN_BACKEND_URL"),
            solana_rpc_url: lookup("SOLANA_RPC_URL")
                .unwrap_or_else(|| "http://localhost:8899".to_string()),
            rate_limit_window: Duration::from_secs(parse_or(
                &lookup,
                "RATE_LIMIT_WINDOW_SECS",
                15 * 60,
            )?),
            rate_limit_max: parse_or(&lookup, "RATE_LIMIT_MAX_REQUESTS", 100)?,
            proxy_timeout: Duration::from_secs(parse_or(&lookup, "PROXY_TIMEOUT_SECS", 30)?),
            status_probe_timeout: Duration::from_millis(parse_or(
                &lookup,
                "STATUS_PROBE_TIMEOUT_MS",
                2000,
            )?),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Settings for the oracle simulator
#[derive(Debug, Clone)]
pub struct OracleSimulatorConfig {
    pub substrate_ws_url: String,
    pub kafka_bootstrap_servers: String,
    pub oracle_account_seed: String,
    pub processing_interval: Duration,
    pub contract_addresses_path: PathBuf,
    pub script_path: PathBuf,
    pub deployment_poll_interval: Duration,
}

impl OracleSimulatorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Garbage, zero or more than a day falls back to the default instead of failing
        let processing_secs = lookup("PROCESSING_INTERVAL")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0 && *secs <= MAX_PROCESSING_INTERVAL_SECS)
            .unwrap_or(DEFAULT_PROCESSING_INTERVAL_SECS);

        let poll_secs: u64 = parse_or(&lookup, "DEPLOYMENT_POLL_INTERVAL_SECS", 5)?;
        if poll_secs == 0 {
            return Err(anyhow!("DEPLOYMENT_POLL_INTERVAL_SECS must be greater than zero"));
        }

        Ok(Self {
            substrate_ws_url: lookup("SUBSTRATE_WS_URL")
                .unwrap_or_else(|| "ws://localhost:9944".to_string()),
            kafka_bootstrap_servers: lookup("KAFKA_BOOTSTRAP_SERVERS")
                .unwrap_or_else(|| "localhost:9092".to_string()),
            oracle_account_seed: lookup("ORACLE_ACCOUNT_SEED")
                .unwrap_or_else(|| "//Alice".to_string()),
            processing_interval: Duration::from_secs(processing_secs),
            contract_addresses_path: PathBuf::from(
                lookup("CONTRACT_ADDRESSES_PATH")
                    .unwrap_or_else(|| "/tmp/contract_addresses".to_string()),
            ),
            script_path: PathBuf::from(
                lookup("INTERACT_SCRIPT_PATH")
                    .unwrap_or_else(|| "./interact_contracts.sh".to_string()),
            ),
            deployment_poll_interval: Duration::from_secs(poll_secs),
        })
    }

    pub fn deployment_summary_path(&self) -> PathBuf {
        self.contract_addresses_path.join("deployment_summary.json")
    }
}

// Program addresses used by the client builders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramIds {
    pub dapp: Pubkey,
    pub registry: Pubkey,
    pub energy_token: Pubkey,
    pub trading: Pubkey,
    pub oracle: Pubkey,
    pub governance: Pubkey,
}

impl Default for ProgramIds {
    fn default() -> Self {
        Self {
            dapp: dapp::ID,
            registry: registry::ID,
            energy_token: energy_token::ID,
            trading: trading::ID,
            oracle: oracle::ID,
            governance: governance::ID,
        }
    }
}

impl ProgramIds {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let pick = |key: &str, default: Pubkey| -> Result<Pubkey> {
            match lookup(key) {
                Some(raw) => Pubkey::from_str(raw.trim())
                    .map_err(|e| anyhow!("Invalid program id in {}: {:?} ({})", key, raw, e)),
                None => Ok(default),
            }
        };

        Ok(Self {
            dapp: pick("DAPP_PROGRAM_ID", defaults.dapp)?,
            registry: pick("REGISTRY_PROGRAM_ID", defaults.registry)?,
            energy_token: pick("ENERGY_TOKEN_PROGRAM_ID", defaults.energy_token)?,
            trading: pick("TRADING_PROGRAM_ID", defaults.trading)?,
            oracle: pick("ORACLE_PROGRAM_ID", defaults.oracle)?,
            governance: pick("GOVERNANCE_PROGRAM_ID", defaults.governance)?,
        })
    }

    // Name/address pairs in a stable order, for status reporting
    pub fn entries(&self) -> Vec<(&'static str, Pubkey)> {
        vec![
            ("dapp", self.dapp),
            ("registry", self.registry),
            ("energy_token", self.energy_token),
            ("trading", self.trading),
            ("oracle", self.oracle),
            ("governance", self.governance),
        ]
    }
}
