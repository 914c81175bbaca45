// The declared id is a placeholder; deployments set GOVERNANCE_PROGRAM_ID

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

use super::anchor::{bare_instruction_data, instruction_data};
use super::{check_max_len, ProgramClientError, Result};

pub const ID: Pubkey = solana_sdk::pubkey!("11111111111111111111111111111111");

pub const POA_CONFIG_SEED: &[u8] = b"poa_config";
pub const POA_CONFIG_ACCOUNT: &str = "PoAConfig";

pub const MAX_REC_VALIDATORS: usize = 10;
pub const MAX_AUTHORITY_NAME_LEN: usize = 64;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct RecValidatorInfo {
    pub pubkey: Pubkey,
    pub authority_name: String,
    pub certification_authority: bool,
    pub active: bool,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PoAConfig {
    pub university_authority: Pubkey,
    pub authorized_rec_validators: Vec<RecValidatorInfo>,
    pub min_rec_validators: u8,
    pub created_at: i64,
}

impl PoAConfig {
    pub fn validator(&self, pubkey: &Pubkey) -> Option<&RecValidatorInfo> {
        self.authorized_rec_validators.iter().find(|v| v.pubkey == *pubkey)
    }

    // Present, active and a certification authority.
    pub fn is_authorized(&self, pubkey: &Pubkey) -> bool {
        self.validator(pubkey)
            .map_or(false, |v| v.active && v.certification_authority)
    }

    pub fn active_validator_count(&self) -> usize {
        self.authorized_rec_validators.iter().filter(|v| v.active).count()
    }

    pub fn has_quorum(&self) -> bool {
        self.active_validator_count() >= self.min_rec_validators as usize
    }

    // The program refuses to drop below the minimum
    pub fn can_remove(&self) -> bool {
        self.authorized_rec_validators.len() > self.min_rec_validators as usize
    }

    pub fn can_deactivate(&self) -> bool {
        self.active_validator_count() > self.min_rec_validators as usize
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PoAInitialized {
    pub authority: Pubkey,
    pub validator_count: u8,
    pub min_validators: u8,
    pub timestamp: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct RecValidatorAdded {
    pub validator: Pubkey,
    pub authority: Pubkey,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct GovernanceProgram {
    pub program_id: Pubkey,
}

impl Default for GovernanceProgram {
    fn default() -> Self {
        Self { program_id: ID }
    }
}

impl GovernanceProgram {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn poa_config_address(&self) -> Pubkey {
        Pubkey::find_program_address(&[POA_CONFIG_SEED], &self.program_id).0
    }

    pub fn initialize_poa_with_rec(
        &self,
        university_authority: &Pubkey,
        sustainability_validator: &Pubkey,
        engineering_validator: &Pubkey,
        facilities_validator: &Pubkey,
    ) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("initialize_poa_with_rec"),
            vec![
                AccountMeta::new(self.poa_config_address(), false),
                AccountMeta::new(*university_authority, true),
                AccountMeta::new_readonly(*sustainability_validator, false),
                AccountMeta::new_readonly(*engineering_validator, false),
                AccountMeta::new_readonly(*facilities_validator, false),
                AccountMeta::new_readonly(system_program::ID, false),
            ],
        )
    }

    pub fn add_authorized_rec_validator(
        &self,
        university_authority: &Pubkey,
        validator: &Pubkey,
        department: &str,
    ) -> Result<Instruction> {
        check_max_len("department", department.as_bytes(), MAX_AUTHORITY_NAME_LEN)?;
        self.admin(
            university_authority,
            &instruction_data("add_authorized_rec_validator", &(*validator, department))?,
        )
    }

    pub fn remove_authorized_rec_validator(
        &self,
        university_authority: &Pubkey,
        validator: &Pubkey,
    ) -> Result<Instruction> {
        self.admin_with_validator(
            "remove_authorized_rec_validator",
            university_authority,
            validator,
        )
    }

    pub fn update_min_rec_validators(
        &self,
        university_authority: &Pubkey,
        new_min: u8,
    ) -> Result<Instruction> {
        if new_min == 0 {
            return Err(ProgramClientError::InvalidArgument(
                "new_min must be greater than zero".to_string(),
            ));
        }
        self.admin(
            university_authority,
            &instruction_data("update_min_rec_validators", &new_min)?,
        )
    }

    pub fn deactivate_rec_validator(
        &self,
        university_authority: &Pubkey,
        validator: &Pubkey,
    ) -> Result<Instruction> {
        self.admin_with_validator("deactivate_rec_validator", university_authority, validator)
    }

    pub fn reactivate_rec_validator(
        &self,
        university_authority: &Pubkey,
        validator: &Pubkey,
    ) -> Result<Instruction> {
        self.admin_with_validator("reactivate_rec_validator", university_authority, validator)
    }

    // View instructions; results come back as return data
    pub fn get_validator_info(&self) -> Instruction {
        Instruction::new_with_bytes(
            self.program_id,
            &bare_instruction_data("get_validator_info"),
            vec![AccountMeta::new_readonly(self.poa_config_address(), false)],
        )
    }

    pub fn is_authorized_rec_validator(&self, validator: &Pubkey) -> Result<Instruction> {
        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data("is_authorized_rec_validator", validator)?,
            vec![AccountMeta::new_readonly(self.poa_config_address(), false)],
        ))
    }

    fn admin_with_validator(
        &self,
        name: &str,
        university_authority: &Pubkey,
        validator: &Pubkey,
    ) -> Result<Instruction> {
        self.admin(university_authority, &instruction_data(name, validator)?)
    }

    fn admin(&self, university_authority: &Pubkey, data: &[u8]) -> Result<Instruction> {
        Ok(Instruction::new_with_bytes(
            self.program_id,
            data,
            vec![
                AccountMeta::new(self.poa_config_address(), false),
                AccountMeta::new_readonly(*university_authority, true),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::anchor::{decode_account, encode_account, instruction_discriminator};

    fn validator(pubkey: Pubkey, certification_authority: bool, active: bool) -> RecValidatorInfo {
        RecValidatorInfo {
            pubkey,
            authority_name: "University Engineering Department".to_string(),
            certification_authority,
            active,
        }
    }

    fn config(validators: Vec<RecValidatorInfo>, min: u8) -> PoAConfig {
        PoAConfig {
            university_authority: Pubkey::new_unique(),
            authorized_rec_validators: validators,
            min_rec_validators: min,
            created_at: 0,
        }
    }

    #[test]
    fn is_authorized_requires_active_certification_authority() {
        let good = Pubkey::new_unique();
        let inactive = Pubkey::new_unique();
        let not_certifying = Pubkey::new_unique();
        let config = config(
            vec![
                validator(good, true, true),
                validator(inactive, true, false),
                validator(not_certifying, false, true),
            ],
            2,
        );

        assert!(config.is_authorized(&good));
        assert!(!config.is_authorized(&inactive));
        assert!(!config.is_authorized(&not_certifying));
        assert!(!config.is_authorized(&Pubkey::new_unique()));
        assert_eq!(config.active_validator_count(), 2);
        assert!(config.has_quorum());
    }

    #[test]
    fn minimum_guards_removal_and_deactivation() {
        let config = config(
            vec![
                validator(Pubkey::new_unique(), true, true),
                validator(Pubkey::new_unique(), true, true),
            ],
            2,
        );
        assert!(!config.can_remove());
        assert!(!config.can_deactivate());

        let mut larger = config.clone();
        larger.authorized_rec_validators.push(validator(Pubkey::new_unique(), true, false));
        assert!(larger.can_remove());
        assert!(!larger.can_deactivate());
    }

    #[test]
    fn initialize_passes_three_department_validators() {
        let program = GovernanceProgram::new(Pubkey::new_unique());
        let authority = Pubkey::new_unique();
        let departments = [Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique()];
        let ix = program.initialize_poa_with_rec(
            &authority,
            &departments[0],
            &departments[1],
            &departments[2],
        );

        assert_eq!(ix.accounts.len(), 6);
        assert_eq!(ix.accounts[1], AccountMeta::new(authority, true));
        for (meta, department) in ix.accounts[2..5].iter().zip(departments.iter()) {
            assert_eq!(*meta, AccountMeta::new_readonly(*department, false));
        }
    }

    #[test]
    fn admin_instructions_carry_validator_key() {
        let program = GovernanceProgram::default();
        let authority = Pubkey::new_unique();
        let target = Pubkey::new_unique();

        for (name, ix) in [
            (
                "remove_authorized_rec_validator",
                program.remove_authorized_rec_validator(&authority, &target),
            ),
            ("deactivate_rec_validator", program.deactivate_rec_validator(&authority, &target)),
            ("reactivate_rec_validator", program.reactivate_rec_validator(&authority, &target)),
        ] {
            let ix = ix.unwrap();
            assert_eq!(&ix.data[..8], &instruction_discriminator(name));
            assert_eq!(&ix.data[8..], target.as_ref());
            assert_eq!(ix.accounts[0], AccountMeta::new(program.poa_config_address(), false));
            assert_eq!(ix.accounts[1], AccountMeta::new_readonly(authority, true));
        }
    }

    #[test]
    fn zero_minimum_is_rejected() {
        let program = GovernanceProgram::default();
        let authority = Pubkey::new_unique();
        assert!(program.update_min_rec_validators(&authority, 0).is_err());
        let ix = program.update_min_rec_validators(&authority, 3).unwrap();
        assert_eq!(&ix.data[8..], &[3]);
    }

    #[test]
    fn views_only_read_the_config() {
        let program = GovernanceProgram::default();
        let ix = program.is_authorized_rec_validator(&Pubkey::new_unique()).unwrap();
        assert_eq!(
            ix.accounts,
            vec![AccountMeta::new_readonly(program.poa_config_address(), false)]
        );
        assert_eq!(program.get_validator_info().accounts, ix.accounts);
    }

    #[test]
    fn decodes_poa_config() {
        let config = config(vec![validator(Pubkey::new_unique(), true, true)], 1);
        let data = encode_account(POA_CONFIG_ACCOUNT, &config).unwrap();
        assert_eq!(decode_account::<PoAConfig>(POA_CONFIG_ACCOUNT, &data).unwrap(), config);
    }
}
