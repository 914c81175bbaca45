// Registry program: users, smart meters and their readings.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

use super::anchor::{bare_instruction_data, instruction_data};
use super::{check_max_len, check_seed, Result};

pub const ID: Pubkey = solana_sdk::pubkey!("EtmU16tPPrGZVdyd9g5zABnq8wMt9UWYNGY4uZVdpQHK");

pub const REGISTRY_SEED: &[u8] = b"registry";
pub const USER_SEED: &[u8] = b"user";
pub const METER_SEED: &[u8] = b"meter";

pub const MAX_LOCATION_LEN: usize = 100;
pub const MAX_METER_ID_LEN: usize = 50;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    Prosumer,
    Consumer,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Suspended,
    Inactive,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterType {
    Solar,
    Wind,
    Battery,
    Grid,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterStatus {
    Active,
    Inactive,
    Maintenance,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    pub authority: Pubkey,
    pub user_count: u64,
    pub meter_count: u64,
    pub created_at: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub authority: Pubkey,
    pub user_type: UserType,
    pub location: String,
    pub status: UserStatus,
    pub registered_at: i64,
    pub meter_count: u32,
    pub created_at: i64,
}

impl UserAccount {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MeterAccount {
    pub meter_id: String,
    pub owner: Pubkey,
    pub meter_type: MeterType,
    pub status: MeterStatus,
    pub registered_at: i64,
    pub last_reading_at: i64,
    pub total_generation: u64,
    pub total_consumption: u64,
}

impl MeterAccount {
    pub fn is_active(&self) -> bool {
        self.status == MeterStatus::Active
    }

    // Generation minus consumption, floored at zero
    pub fn net_generation(&self) -> u64 {
        self.total_generation.saturating_sub(self.total_consumption)
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MeterReadingUpdated {
    pub meter_id: String,
    pub owner: Pubkey,
    pub energy_generated: u64,
    pub energy_consumed: u64,
    pub timestamp: i64,
}

fn check_meter_id(meter_id: &str) -> Result<()> {
    check_max_len("meter_id", meter_id.as_bytes(), MAX_METER_ID_LEN)?;
    check_seed("meter_id", meter_id)
}

#[derive(Debug, Clone, Copy)]
pub struct RegistryProgram {
    pub program_id: Pubkey,
}

impl Default for RegistryProgram {
    fn default() -> Self {
        Self { program_id: ID }
    }
}

impl RegistryProgram {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn registry_address(&self) -> Pubkey {
        Pubkey::find_program_address(&[REGISTRY_SEED], &self.program_id).0
    }

    pub fn user_address(&self, user_authority: &Pubkey) -> Pubkey {
        Pubkey::find_program_address(&[USER_SEED, user_authority.as_ref()], &self.program_id).0
    }

    pub fn meter_address(&self, meter_id: &str) -> Result<Pubkey> {
        check_meter_id(meter_id)?;
        Ok(Pubkey::find_program_address(&[METER_SEED, meter_id.as_bytes()], &self.program_id).0)
    }

    pub fn initialize(&self, authority: &Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("initialize"),
            vec![
                AccountMeta::new(self.registry_address(), false),
                AccountMeta::new(*authority, true),
                AccountMeta::new_readonly(system_program::ID, false),
            ],
        )
    }

    pub fn register_user(
        &self,
        user_authority: &Pubkey,
        user_type: UserType,
        location: &str,
    ) -> Result<Instruction> {
        check_max_len("location", location.as_bytes(), MAX_LOCATION_LEN)?;

        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("register_user", &(user_type, location))?,
            vec![
                AccountMeta::new(self.registry_address(), false),
                AccountMeta::new(self.user_address(user_authority), false),
                AccountMeta::new(*user_authority, true),
                AccountMeta::new_readonly(system_program::ID, false),
            ],
        ))
    }

    pub fn register_meter(
        &self,
        user_authority: &Pubkey,
        meter_id: &str,
        meter_type: MeterType,
    ) -> Result<Instruction> {
        let meter = self.meter_address(meter_id)?;

        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("register_meter", &(meter_id, meter_type))?,
            vec![
                AccountMeta::new(self.registry_address(), false),
                AccountMeta::new(self.user_address(user_authority), false),
                AccountMeta::new(meter, false),
                AccountMeta::new(*user_authority, true),
                AccountMeta::new_readonly(system_program::ID, false),
            ],
        ))
    }

    // Registry authority only
    pub fn update_user_status(
        &self,
        authority: &Pubkey,
        user_authority: &Pubkey,
        new_status: UserStatus,
    ) -> Result<Instruction> {
        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("update_user_status", &new_status)?,
            vec![
                AccountMeta::new_readonly(self.registry_address(), false),
                AccountMeta::new(self.user_address(user_authority), false),
                AccountMeta::new_readonly(*authority, true),
            ],
        ))
    }

    pub fn update_meter_reading(
        &self,
        oracle_authority: &Pubkey,
        meter_id: &str,
        energy_generated: u64,
        energy_consumed: u64,
        reading_timestamp: i64,
    ) -> Result<Instruction> {
        let meter = self.meter_address(meter_id)?;

        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data(
                "update_meter_reading",
                &(energy_generated, energy_consumed, reading_timestamp),
            )?,
            vec![
                AccountMeta::new(meter, false),
                AccountMeta::new_readonly(*oracle_authority, true),
            ],
        ))
    }

    // View instruction; the answer comes back as return data
    pub fn is_valid_user(&self, user_authority: &Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("is_valid_user"),
            vec![AccountMeta::new_readonly(self.user_address(user_authority), false)],
        )
    }

    pub fn is_valid_meter(&self, meter_id: &str) -> Result<Instruction> {
        Ok(Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("is_valid_meter"),
            vec![AccountMeta::new_readonly(self.meter_address(meter_id)?, false)],
        ))
    }

    // No PDA is derived here, so only the account limit applies
    pub fn assign_meter(&self, authority: &Pubkey, meter_id: &str) -> Result<Instruction> {
        check_max_len("meter_id", meter_id.as_bytes(), MAX_METER_ID_LEN)?;

        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("assign_meter", meter_id)?,
            vec![
                AccountMeta::new(self.registry_address(), false),
                AccountMeta::new_readonly(*authority, true),
            ],
        ))
    }
}
