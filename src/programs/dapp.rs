// Demo counter program used to scaffold the client.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

use super::anchor::{self, account_discriminator, bare_instruction_data, instruction_data};
use super::Result;

pub const ID: Pubkey = solana_sdk::pubkey!("Count3AcZucFDPSFBAeHkQ6AvttieKUkyJ8HiQGhQwe");

pub const DAPP_ACCOUNT: &str = "Dapp";

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DappAccount {
    pub count: u8,
}

impl DappAccount {
    pub fn decode(data: &[u8]) -> Result<Self> {
        anchor::decode_account(DAPP_ACCOUNT, data)
    }
}

// Bytes every Dapp account starts with; used as the memcmp filter
pub fn account_filter_bytes() -> [u8; 8] {
    account_discriminator(DAPP_ACCOUNT)
}

#[derive(Debug, Clone, Copy)]
pub struct DappProgram {
    pub program_id: Pubkey,
}

impl Default for DappProgram {
    fn default() -> Self {
        Self { program_id: ID }
    }
}

impl DappProgram {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    // `dapp` is a fresh keypair address; it signs alongside the payer
    pub fn initialize(&self, payer: &Pubkey, dapp: &Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("initialize"),
            vec![
                AccountMeta::new(*payer, true),
                AccountMeta::new(*dapp, true),
                AccountMeta::new_readonly(system_program::ID, false),
            ],
        )
    }

    pub fn increment(&self, dapp: &Pubkey) -> Instruction {
        self.update("increment", dapp)
    }

    pub fn decrement(&self, dapp: &Pubkey) -> Instruction {
        self.update("decrement", dapp)
    }

    pub fn set(&self, dapp: &Pubkey, value: u8) -> Result<Instruction> {
        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("set", &value)?,
            vec![AccountMeta::new(*dapp, false)],
        ))
    }

    // Closes the account and returns its lamports to the payer
    pub fn close(&self, payer: &Pubkey, dapp: &Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("close"),
            vec![AccountMeta::new(*payer, true), AccountMeta::new(*dapp, false)],
        )
    }

    fn update(&self, name: &str, dapp: &Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data(name),
            vec![AccountMeta::new(*dapp, false)],
        )
    }
}
