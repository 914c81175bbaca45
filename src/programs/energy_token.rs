// Energy token program: the GRID token mint wrapper and REC validator list.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;
use spl_associated_token_account::get_associated_token_address;

use super::anchor::{bare_instruction_data, instruction_data};
use super::{check_max_len, check_non_zero, Result};

pub const ID: Pubkey = solana_sdk::pubkey!("J61eiwojt9zA1TP6t9M9wEDmiDek4QNEY2HiAfunHs7");

pub const TOKEN_INFO_SEED: &[u8] = b"token_info";

pub const MAX_AUTHORITY_NAME_LEN: usize = 64;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub authority: Pubkey,
    pub mint: Pubkey,
    pub total_supply: u64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct EnergyTokenProgram {
    pub program_id: Pubkey,
}

impl Default for EnergyTokenProgram {
    fn default() -> Self {
        Self { program_id: ID }
    }
}

impl EnergyTokenProgram {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn token_info_address(&self) -> Pubkey {
        Pubkey::find_program_address(&[TOKEN_INFO_SEED], &self.program_id).0
    }

    pub fn initialize(&self, authority: &Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("initialize"),
            vec![AccountMeta::new_readonly(*authority, true)],
        )
    }

    pub fn initialize_token(&self, authority: &Pubkey, mint: &Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("initialize_token"),
            vec![
                AccountMeta::new(self.token_info_address(), false),
                AccountMeta::new_readonly(*mint, false),
                AccountMeta::new(*authority, true),
                AccountMeta::new_readonly(system_program::ID, false),
            ],
        )
    }

    pub fn add_rec_validator(
        &self,
        authority: &Pubkey,
        validator: &Pubkey,
        authority_name: &str,
    ) -> Result<Instruction> {
        check_max_len("authority_name", authority_name.as_bytes(), MAX_AUTHORITY_NAME_LEN)?;

        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("add_rec_validator", &(*validator, authority_name))?,
            vec![
                AccountMeta::new(self.token_info_address(), false),
                AccountMeta::new_readonly(*authority, true),
            ],
        ))
    }

    // Moves tokens between the owners' associated token accounts
    pub fn transfer_tokens(
        &self,
        from_owner: &Pubkey,
        to_owner: &Pubkey,
        mint: &Pubkey,
        amount: u64,
    ) -> Result<Instruction> {
        check_non_zero("amount", amount)?;

        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("transfer_tokens", &amount)?,
            vec![
                AccountMeta::new(get_associated_token_address(from_owner, mint), false),
                AccountMeta::new(get_associated_token_address(to_owner, mint), false),
                AccountMeta::new_readonly(*from_owner, true),
                AccountMeta::new_readonly(spl_token::ID, false),
            ],
        ))
    }

    pub fn burn_tokens(&self, owner: &Pubkey, mint: &Pubkey, amount: u64) -> Result<Instruction> {
        check_non_zero("amount", amount)?;

        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("burn_tokens", &amount)?,
            vec![
                AccountMeta::new(self.token_info_address(), false),
                AccountMeta::new(*mint, false),
                AccountMeta::new(get_associated_token_address(owner, mint), false),
                AccountMeta::new_readonly(*owner, true),
                AccountMeta::new_readonly(spl_token::ID, false),
            ],
        ))
    }
}
