use std::time::Duration;

use borsh::BorshDeserialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use tracing::{debug, info, warn};

use super::anchor::decode_account;
use super::dapp::{self, DappAccount, DappProgram};
use super::energy_token::{EnergyTokenProgram, TokenInfo};
use super::governance::{GovernanceProgram, PoAConfig, POA_CONFIG_ACCOUNT};
use super::oracle::{OracleConfig, OracleProgram};
use super::registry::{MeterAccount, Registry, RegistryProgram, UserAccount};
use super::trading::{Market, TradingProgram};
use super::{ProgramClientError, Result};
use crate::config::ProgramIds;

const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Async access to the deployed programs over JSON-RPC.
pub struct ProgramRpc {
    client: RpcClient,
    ids: ProgramIds,
}

impl ProgramRpc {
    pub fn new(rpc_url: impl Into<String>, ids: ProgramIds) -> Self {
        Self::with_timeout(rpc_url, ids, DEFAULT_RPC_TIMEOUT)
    }

    pub fn with_timeout(rpc_url: impl Into<String>, ids: ProgramIds, timeout: Duration) -> Self {
        let client = RpcClient::new_with_timeout_and_commitment(
            rpc_url.into(),
            timeout,
            CommitmentConfig::confirmed(),
        );
        Self { client, ids }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    pub fn program_ids(&self) -> &ProgramIds {
        &self.ids
    }

    pub fn dapp(&self) -> DappProgram {
        DappProgram::new(self.ids.dapp)
    }

    pub fn registry(&self) -> RegistryProgram {
        RegistryProgram::new(self.ids.registry)
    }

    pub fn energy_token(&self) -> EnergyTokenProgram {
        EnergyTokenProgram::new(self.ids.energy_token)
    }

    pub fn trading(&self) -> TradingProgram {
        TradingProgram::new(self.ids.trading)
    }

    pub fn oracle(&self) -> OracleProgram {
        OracleProgram::new(self.ids.oracle)
    }

    pub fn governance(&self) -> GovernanceProgram {
        GovernanceProgram::new(self.ids.governance)
    }

    /// Version string of the node behind the endpoint.
    pub async fn version(&self) -> Result<String> {
        let version = self.client.get_version().await?;
        Ok(version.solana_core)
    }

    /// Sign with the payer plus any extra signers, submit and wait for confirmation.
    pub async fn send(
        &self,
        payer: &Keypair,
        extra_signers: &[&Keypair],
        instructions: &[Instruction],
    ) -> Result<Signature> {
        if instructions.is_empty() {
            return Err(ProgramClientError::InvalidArgument("no instructions to send".to_string()));
        }

        let blockhash = self.client.get_latest_blockhash().await?;

        let mut signers: Vec<&Keypair> = vec![payer];
        signers.extend_from_slice(extra_signers);

        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&payer.pubkey()),
            &signers,
            blockhash,
        );

        let signature = self.client.send_and_confirm_transaction(&transaction).await?;
        info!("Transaction confirmed: {} ({} instructions)", signature, instructions.len());
        Ok(signature)
    }

    /// Fetch one account and decode it as the named Anchor account type.
    pub async fn fetch<T>(&self, account_name: &str, address: &Pubkey) -> Result<T>
    where
        T: BorshDeserialize,
    {
        let response = self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .await?;

        let account = response.value.ok_or(ProgramClientError::AccountNotFound(*address))?;
        debug!("Fetched {} {} ({} bytes)", account_name, address, account.data.len());

        decode_account(account_name, &account.data)
    }

    /// Every counter account owned by the dapp program.
    pub async fn dapp_accounts(&self) -> Result<Vec<(Pubkey, DappAccount)>> {
        let accounts = self
            .client
            .get_program_accounts_with_config(&self.ids.dapp, dapp_accounts_config())
            .await?;

        let mut decoded = Vec::with_capacity(accounts.len());
        for (address, account) in accounts {
            match DappAccount::decode(&account.data) {
                Ok(dapp) => decoded.push((address, dapp)),
                Err(e) => warn!("Skipping undecodable dapp account {}: {}", address, e),
            }
        }
        Ok(decoded)
    }

    pub async fn registry_state(&self) -> Result<Registry> {
        self.fetch("Registry", &self.registry().registry_address()).await
    }

    pub async fn user_account(&self, user_authority: &Pubkey) -> Result<UserAccount> {
        self.fetch("UserAccount", &self.registry().user_address(user_authority)).await
    }

    pub async fn meter_account(&self, meter_id: &str) -> Result<MeterAccount> {
        let address = self.registry().meter_address(meter_id)?;
        self.fetch("MeterAccount", &address).await
    }

    pub async fn token_info(&self) -> Result<TokenInfo> {
        self.fetch("TokenInfo", &self.energy_token().token_info_address()).await
    }

    pub async fn market(&self) -> Result<Market> {
        self.fetch("Market", &self.trading().market_address()).await
    }

    pub async fn oracle_config(&self) -> Result<OracleConfig> {
        self.fetch("OracleConfig", &self.oracle().oracle_config_address()).await
    }

    pub async fn poa_config(&self) -> Result<PoAConfig> {
        self.fetch(POA_CONFIG_ACCOUNT, &self.governance().poa_config_address()).await
    }
}

/// Program-accounts query that only matches `Dapp` accounts.
pub fn dapp_accounts_config() -> RpcProgramAccountsConfig {
    RpcProgramAccountsConfig {
        filters: Some(vec![RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
            0,
            &dapp::account_filter_bytes(),
        ))]),
        account_config: RpcAccountInfoConfig {
            commitment: Some(CommitmentConfig::confirmed()),
            ..RpcAccountInfoConfig::default()
        },
        ..RpcProgramAccountsConfig::default()
    }
}
