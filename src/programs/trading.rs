// Trading program: the energy market, its orders and trade records.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

use super::anchor::{bare_instruction_data, instruction_data};
use super::{check_non_zero, ProgramClientError, Result};

pub const ID: Pubkey = solana_sdk::pubkey!("UbU6TWh6YP4kYQuj8t7xiNg65NdEQF9kfAKa4aS85iS");

pub const MARKET_SEED: &[u8] = b"market";

pub const MAX_FEE_BPS: u16 = 10_000;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Sell,
    Buy,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Active,
    PartiallyFilled,
    Completed,
    Cancelled,
    Expired,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Market {
    pub authority: Pubkey,
    pub active_orders: u64,
    pub total_volume: u64,
    pub total_trades: u64,
    pub created_at: i64,
    pub clearing_enabled: bool,
    pub market_fee_bps: u16,
}

impl Market {
    // Fee charged on a trade of `total_value` at the current rate,
    // rounded down.
    pub fn fee_for(&self, total_value: u64) -> u64 {
        ((total_value as u128 * self.market_fee_bps as u128) / MAX_FEE_BPS as u128) as u64
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub seller: Pubkey,
    pub buyer: Pubkey,
    pub amount: u64,
    pub filled_amount: u64,
    pub price_per_kwh: u64,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub created_at: i64,
    pub expires_at: i64,
}

impl Order {
    pub fn remaining(&self) -> u64 {
        self.amount.saturating_sub(self.filled_amount)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, OrderStatus::Active | OrderStatus::PartiallyFilled)
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    pub sell_order: Pubkey,
    pub buy_order: Pubkey,
    pub seller: Pubkey,
    pub buyer: Pubkey,
    pub amount: u64,
    pub price_per_kwh: u64,
    pub total_value: u64,
    pub fee_amount: u64,
    pub executed_at: i64,
}

// Events

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MarketInitialized {
    pub authority: Pubkey,
    pub timestamp: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct SellOrderCreated {
    pub seller: Pubkey,
    pub order_id: Pubkey,
    pub amount: u64,
    pub price_per_kwh: u64,
    pub timestamp: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct BuyOrderCreated {
    pub buyer: Pubkey,
    pub order_id: Pubkey,
    pub amount: u64,
    pub price_per_kwh: u64,
    pub timestamp: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderMatched {
    pub sell_order: Pubkey,
    pub buy_order: Pubkey,
    pub seller: Pubkey,
    pub buyer: Pubkey,
    pub amount: u64,
    pub price: u64,
    pub total_value: u64,
    pub fee_amount: u64,
    pub timestamp: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderCancelled {
    pub order_id: Pubkey,
    pub user: Pubkey,
    pub timestamp: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MarketParamsUpdated {
    pub authority: Pubkey,
    pub market_fee_bps: u16,
    pub clearing_enabled: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct TradingProgram {
    pub program_id: Pubkey,
}

impl Default for TradingProgram {
    fn default() -> Self {
        Self { program_id: ID }
    }
}

impl TradingProgram {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn market_address(&self) -> Pubkey {
        Pubkey::find_program_address(&[MARKET_SEED], &self.program_id).0
    }

    pub fn initialize(&self, authority: &Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("initialize"),
            vec![AccountMeta::new_readonly(*authority, true)],
        )
    }

    pub fn initialize_market(&self, authority: &Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("initialize_market"),
            vec![
                AccountMeta::new(self.market_address(), false),
                AccountMeta::new(*authority, true),
                AccountMeta::new_readonly(system_program::ID, false),
            ],
        )
    }

    pub fn create_sell_order(
        &self,
        seller: &Pubkey,
        energy_amount: u64,
        price_per_kwh: u64,
    ) -> Result<Instruction> {
        self.create_order("create_sell_order", seller, energy_amount, price_per_kwh)
    }

    pub fn create_buy_order(
        &self,
        buyer: &Pubkey,
        energy_amount: u64,
        max_price_per_kwh: u64,
    ) -> Result<Instruction> {
        self.create_order("create_buy_order", buyer, energy_amount, max_price_per_kwh)
    }

    pub fn match_orders(&self, authority: &Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("match_orders"),
            self.market_and_signer(authority),
        )
    }

    pub fn cancel_order(&self, authority: &Pubkey, order_id: u64) -> Result<Instruction> {
        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("cancel_order", &order_id)?,
            self.market_and_signer(authority),
        ))
    }

    // Market authority only
    pub fn update_market_params(
        &self,
        authority: &Pubkey,
        market_fee_bps: u16,
        clearing_enabled: bool,
    ) -> Result<Instruction> {
        if market_fee_bps > MAX_FEE_BPS {
            return Err(ProgramClientError::InvalidArgument(format!(
                "market_fee_bps {} exceeds {}",
                market_fee_bps, MAX_FEE_BPS
            )));
        }

        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("update_market_params", &(market_fee_bps, clearing_enabled))?,
            self.market_and_signer(authority),
        ))
    }

    fn create_order(
        &self,
        name: &str,
        authority: &Pubkey,
        energy_amount: u64,
        price: u64,
    ) -> Result<Instruction> {
        check_non_zero("energy_amount", energy_amount)?;
        check_non_zero("price_per_kwh", price)?;

        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data(name, &(energy_amount, price))?,
            vec![
                AccountMeta::new(self.market_address(), false),
                AccountMeta::new(*authority, true),
                AccountMeta::new_readonly(system_program::ID, false),
            ],
        ))
    }

    fn market_and_signer(&self, authority: &Pubkey) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.market_address(), false),
            AccountMeta::new_readonly(*authority, true),
        ]
    }
}
