// Oracle program: AMI meter submissions, data requests and market clearing
// triggers. Operators are registered per role in the oracle config.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

use super::anchor::{bare_instruction_data, instruction_data};
use super::{check_max_len, check_seed, Result};

pub const ID: Pubkey = solana_sdk::pubkey!("BrFkiEYxP6saiVHVBoaDYJZ2RRZnoXoo9P47PuwP9tHA");

pub const ORACLE_CONFIG_SEED: &[u8] = b"oracle_config";
pub const METER_DATA_SEED: &[u8] = b"meter_data";
pub const ORACLE_REQUEST_SEED: &[u8] = b"oracle_request";

pub const MAX_OPERATORS: usize = 20;
pub const MAX_SIGNATURE_LEN: usize = 128;
pub const MAX_RESPONSE_DATA_LEN: usize = 256;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorType {
    AmiIntegration,
    MarketClearing,
    PriceOracle,
    WeatherData,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum RequestType {
    EnergyData { meter_id: String },
    MarketClearing,
    PriceData,
    WeatherData { location: String },
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Fulfilled,
    Expired,
    Failed,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct OracleOperator {
    pub pubkey: Pubkey,
    pub operator_type: OperatorType,
    pub active: bool,
    pub added_at: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    pub authority: Pubkey,
    pub registry_program: Pubkey,
    pub energy_token_program: Pubkey,
    pub trading_program: Pubkey,
    pub next_request_id: u64,
    pub operators: Vec<OracleOperator>,
    pub auto_market_clearing: bool,
    pub market_clearing_interval: i64,
    pub created_at: i64,
}

impl OracleConfig {
    // Registered and active, optionally for one role
    pub fn is_active_operator(&self, operator: &Pubkey, role: Option<OperatorType>) -> bool {
        self.operators.iter().any(|op| {
            op.pubkey == *operator
                && op.active
                && role.map_or(true, |role| op.operator_type == role)
        })
    }

    pub fn can_submit_meter_data(&self, operator: &Pubkey) -> bool {
        self.is_active_operator(operator, Some(OperatorType::AmiIntegration))
    }

    pub fn can_trigger_market_clearing(&self, operator: &Pubkey) -> bool {
        self.auto_market_clearing
            && self.is_active_operator(operator, Some(OperatorType::MarketClearing))
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MeterData {
    pub meter_id: String,
    pub energy_generated: u64,
    pub energy_consumed: u64,
    pub reading_timestamp: i64,
    pub signature: Vec<u8>,
    pub submitted_at: i64,
    pub oracle_operator: Pubkey,
    pub processed: bool,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    pub request_id: u64,
    pub requester: Pubkey,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub requested_at: i64,
    pub expires_at: i64,
    pub fulfilled_at: Option<i64>,
    pub response_data: Vec<u8>,
}

// Events

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MeterDataSubmitted {
    pub meter_id: String,
    pub energy_generated: u64,
    pub energy_consumed: u64,
    pub reading_timestamp: i64,
    pub oracle_operator: Pubkey,
    pub timestamp: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MarketClearingTriggered {
    pub oracle_operator: Pubkey,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct OracleProgram {
    pub program_id: Pubkey,
}

impl Default for OracleProgram {
    fn default() -> Self {
        Self { program_id: ID }
    }
}

impl OracleProgram {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn oracle_config_address(&self) -> Pubkey {
        Pubkey::find_program_address(&[ORACLE_CONFIG_SEED], &self.program_id).0
    }

    // The program seeds meter data with the cluster clock at submission, so
    // callers pass the timestamp the transaction is expected to land at.
    pub fn meter_data_address(&self, meter_id: &str, submitted_at: i64) -> Result<Pubkey> {
        check_seed("meter_id", meter_id)?;
        Ok(Pubkey::find_program_address(
            &[METER_DATA_SEED, meter_id.as_bytes(), &submitted_at.to_le_bytes()],
            &self.program_id,
        )
        .0)
    }

    pub fn oracle_request_address(&self, requester: &Pubkey, request_id: u64) -> Pubkey {
        Pubkey::find_program_address(
            &[ORACLE_REQUEST_SEED, requester.as_ref(), &request_id.to_le_bytes()],
            &self.program_id,
        )
        .0
    }

    pub fn initialize_oracle(
        &self,
        authority: &Pubkey,
        registry_program: &Pubkey,
        energy_token_program: &Pubkey,
        trading_program: &Pubkey,
    ) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("initialize_oracle"),
            vec![
                AccountMeta::new(self.oracle_config_address(), false),
                AccountMeta::new_readonly(*registry_program, false),
                AccountMeta::new_readonly(*energy_token_program, false),
                AccountMeta::new_readonly(*trading_program, false),
                AccountMeta::new(*authority, true),
                AccountMeta::new_readonly(system_program::ID, false),
            ],
        )
    }

    pub fn add_oracle_operator(
        &self,
        authority: &Pubkey,
        operator: &Pubkey,
        operator_type: OperatorType,
    ) -> Result<Instruction> {
        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("add_oracle_operator", &(*operator, operator_type))?,
            vec![
                AccountMeta::new(self.oracle_config_address(), false),
                AccountMeta::new_readonly(*authority, true),
            ],
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn submit_meter_data(
        &self,
        oracle_operator: &Pubkey,
        meter_id: &str,
        energy_generated: u64,
        energy_consumed: u64,
        reading_timestamp: i64,
        signature: &[u8],
        submitted_at: i64,
    ) -> Result<Instruction> {
        check_max_len("signature", signature, MAX_SIGNATURE_LEN)?;
        let meter_data = self.meter_data_address(meter_id, submitted_at)?;

        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data(
                "submit_meter_data",
                &(meter_id, energy_generated, energy_consumed, reading_timestamp, signature),
            )?,
            vec![
                AccountMeta::new_readonly(self.oracle_config_address(), false),
                AccountMeta::new(meter_data, false),
                AccountMeta::new(*oracle_operator, true),
                AccountMeta::new_readonly(system_program::ID, false),
            ],
        ))
    }

    // `next_request_id` comes from the current oracle config
    pub fn request_oracle_data(
        &self,
        requester: &Pubkey,
        next_request_id: u64,
        request_type: &RequestType,
    ) -> Result<Instruction> {
        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("request_oracle_data", request_type)?,
            vec![
                AccountMeta::new(self.oracle_config_address(), false),
                AccountMeta::new(self.oracle_request_address(requester, next_request_id), false),
                AccountMeta::new(*requester, true),
                AccountMeta::new_readonly(system_program::ID, false),
            ],
        ))
    }

    pub fn fulfill_oracle_request(
        &self,
        oracle_operator: &Pubkey,
        oracle_request: &Pubkey,
        request_data: &[u8],
    ) -> Result<Instruction> {
        check_max_len("request_data", request_data, MAX_RESPONSE_DATA_LEN)?;

        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("fulfill_oracle_request", request_data)?,
            vec![
                AccountMeta::new_readonly(self.oracle_config_address(), false),
                AccountMeta::new(*oracle_request, false),
                AccountMeta::new_readonly(*oracle_operator, true),
            ],
        ))
    }

    pub fn trigger_market_clearing(&self, oracle_operator: &Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("trigger_market_clearing"),
            vec![
                AccountMeta::new_readonly(self.oracle_config_address(), false),
                AccountMeta::new_readonly(*oracle_operator, true),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::anchor::{decode_account, encode_account, instruction_discriminator};
    use crate::programs::ProgramClientError;

    fn config_with(operators: Vec<OracleOperator>) -> OracleConfig {
        OracleConfig {
            authority: Pubkey::new_unique(),
            registry_program: crate::programs::registry::ID,
            energy_token_program: crate::programs::energy_token::ID,
            trading_program: crate::programs::trading::ID,
            next_request_id: 1,
            operators,
            auto_market_clearing: true,
            market_clearing_interval: 3600,
            created_at: 0,
        }
    }

    fn operator(pubkey: Pubkey, operator_type: OperatorType, active: bool) -> OracleOperator {
        OracleOperator { pubkey, operator_type, active, added_at: 0 }
    }

    #[test]
    fn initialize_oracle_lists_linked_programs() {
        let program = OracleProgram::default();
        let authority = Pubkey::new_unique();
        let ix = program.initialize_oracle(
            &authority,
            &crate::programs::registry::ID,
            &crate::programs::energy_token::ID,
            &crate::programs::trading::ID,
        );

        assert_eq!(ix.accounts.len(), 6);
        assert_eq!(ix.accounts[0], AccountMeta::new(program.oracle_config_address(), false));
        assert_eq!(ix.accounts[1], AccountMeta::new_readonly(crate::programs::registry::ID, false));
        assert_eq!(ix.accounts[3], AccountMeta::new_readonly(crate::programs::trading::ID, false));
        assert_eq!(ix.accounts[4], AccountMeta::new(authority, true));
        assert_eq!(ix.data, instruction_discriminator("initialize_oracle").to_vec());
    }

    #[test]
    fn meter_data_pda_depends_on_submission_time() {
        let program = OracleProgram::default();
        let a = program.meter_data_address("AMI-001", 1_700_000_000).unwrap();
        let b = program.meter_data_address("AMI-001", 1_700_000_001).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, program.meter_data_address("AMI-001", 1_700_000_000).unwrap());
    }

    #[test]
    fn submit_meter_data_layout() {
        let program = OracleProgram::default();
        let operator = Pubkey::new_unique();
        let ix = program
            .submit_meter_data(
                &operator,
                "AMI-7",
                900,
                100,
                1_700_000_000,
                &[7u8; 64],
                1_700_000_005,
            )
            .unwrap();

        let mut expected = instruction_discriminator("submit_meter_data").to_vec();
        expected.extend_from_slice(&5u32.to_le_bytes());
        expected.extend_from_slice(b"AMI-7");
        expected.extend_from_slice(&900u64.to_le_bytes());
        expected.extend_from_slice(&100u64.to_le_bytes());
        expected.extend_from_slice(&1_700_000_000i64.to_le_bytes());
        expected.extend_from_slice(&64u32.to_le_bytes());
        expected.extend_from_slice(&[7u8; 64]);
        assert_eq!(ix.data, expected);

        assert!(!ix.accounts[0].is_writable);
        assert_eq!(
            ix.accounts[1].pubkey,
            program.meter_data_address("AMI-7", 1_700_000_005).unwrap()
        );
        assert_eq!(ix.accounts[2], AccountMeta::new(operator, true));
    }

    #[test]
    fn oversized_signature_is_rejected() {
        let program = OracleProgram::default();
        let operator = Pubkey::new_unique();
        let result = program.submit_meter_data(&operator, "AMI-1", 1, 1, 1, &[0u8; 129], 1);
        assert!(matches!(result, Err(ProgramClientError::InvalidArgument(_))));
        assert!(program
            .submit_meter_data(&operator, "AMI-1", 1, 1, 1, &[0u8; MAX_SIGNATURE_LEN], 1)
            .is_ok());
    }

    #[test]
    fn trigger_market_clearing_is_read_only_on_config() {
        let program = OracleProgram::default();
        let operator = Pubkey::new_unique();
        let ix = program.trigger_market_clearing(&operator);
        assert_eq!(
            ix.accounts,
            vec![
                AccountMeta::new_readonly(program.oracle_config_address(), false),
                AccountMeta::new_readonly(operator, true),
            ]
        );
    }

    #[test]
    fn request_pda_follows_request_id() {
        let program = OracleProgram::default();
        let requester = Pubkey::new_unique();
        let request = RequestType::EnergyData { meter_id: "AMI-1".to_string() };
        let ix = program.request_oracle_data(&requester, 3, &request).unwrap();

        assert_eq!(ix.accounts[1].pubkey, program.oracle_request_address(&requester, 3));
        assert_ne!(ix.accounts[1].pubkey, program.oracle_request_address(&requester, 4));
        // variant index 0, then the string
        assert_eq!(ix.data[8], 0);
        assert_eq!(&ix.data[9..13], &5u32.to_le_bytes());

        assert!(program
            .fulfill_oracle_request(&Pubkey::new_unique(), &ix.accounts[1].pubkey, &[0u8; 257])
            .is_err());
    }

    #[test]
    fn operator_roles_gate_submission_and_clearing() {
        let ami = Pubkey::new_unique();
        let clearer = Pubkey::new_unique();
        let retired = Pubkey::new_unique();
        let mut config = config_with(vec![
            operator(ami, OperatorType::AmiIntegration, true),
            operator(clearer, OperatorType::MarketClearing, true),
            operator(retired, OperatorType::AmiIntegration, false),
        ]);

        assert!(config.can_submit_meter_data(&ami));
        assert!(!config.can_submit_meter_data(&clearer));
        assert!(!config.can_submit_meter_data(&retired));
        assert!(config.can_trigger_market_clearing(&clearer));
        assert!(config.is_active_operator(&ami, None));
        assert!(!config.is_active_operator(&Pubkey::new_unique(), None));

        config.auto_market_clearing = false;
        assert!(!config.can_trigger_market_clearing(&clearer));
    }

    #[test]
    fn decodes_oracle_config_with_operators() {
        let config = config_with(vec![operator(
            Pubkey::new_unique(),
            OperatorType::PriceOracle,
            true,
        )]);
        let data = encode_account("OracleConfig", &config).unwrap();
        assert_eq!(decode_account::<OracleConfig>("OracleConfig", &data).unwrap(), config);
    }
}
