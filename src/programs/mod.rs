pub mod anchor;
pub mod dapp;
pub mod energy_token;
pub mod governance;
pub mod oracle;
pub mod registry;
pub mod rpc;
pub mod trading;

use solana_sdk::pubkey::{Pubkey, MAX_SEED_LEN};
use thiserror::Error;

pub use rpc::ProgramRpc;

#[derive(Debug, Error)]
pub enum ProgramClientError {
    #[error("account {0} not found")]
    AccountNotFound(Pubkey),

    #[error("account data too small ({0} bytes)")]
    AccountTooSmall(usize),

    #[error("account discriminator does not match {0}")]
    DiscriminatorMismatch(String),

    #[error("failed to decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("rpc error: {0}")]
    Rpc(#[from] Box<solana_client::client_error::ClientError>),
}

impl From<solana_client::client_error::ClientError> for ProgramClientError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        ProgramClientError::Rpc(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, ProgramClientError>;

// Strings that end up as PDA seeds must fit a single seed
pub(crate) fn check_seed(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ProgramClientError::InvalidArgument(format!("{} must not be empty", field)));
    }
    if value.len() > MAX_SEED_LEN {
        return Err(ProgramClientError::InvalidArgument(format!(
            "{} is {} bytes, seeds are limited to {}",
            field,
            value.len(),
            MAX_SEED_LEN
        )));
    }
    Ok(())
}

pub(crate) fn check_max_len(field: &str, value: &[u8], max: usize) -> Result<()> {
    if value.len() > max {
        return Err(ProgramClientError::InvalidArgument(format!(
            "{} is {} bytes, at most {} allowed",
            field,
            value.len(),
            max
        )));
    }
    Ok(())
}

pub(crate) fn check_non_zero(field: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(ProgramClientError::InvalidArgument(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(())
}
