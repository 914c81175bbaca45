// Anchor wire format: 8-byte sha256("<namespace>:<name>") prefix, then Borsh

use base64::Engine;
use borsh::{BorshDeserialize, BorshSerialize};
use sha2::{Digest, Sha256};

use super::ProgramClientError;

pub const DISCRIMINATOR_LEN: usize = 8;

const PROGRAM_DATA_PREFIX: &str = "Program data: ";

pub fn discriminator(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();

    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

pub fn instruction_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator("global", name)
}

pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator("account", name)
}

pub fn event_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator("event", name)
}

// Instruction data for a handler that takes no arguments.
pub fn bare_instruction_data(name: &str) -> Vec<u8> {
    instruction_discriminator(name).to_vec()
}

pub fn instruction_data<T>(name: &str, args: &T) -> Result<Vec<u8>, ProgramClientError>
where
    T: BorshSerialize + ?Sized,
{
    let mut data = bare_instruction_data(name);
    args.serialize(&mut data)
        .map_err(|source| ProgramClientError::Serialize { name: name.to_string(), source })?;
    Ok(data)
}

// Decode account data of the named type. Trailing bytes (unused account
// space) are ignored.
pub fn decode_account<T>(name: &str, data: &[u8]) -> Result<T, ProgramClientError>
where
    T: BorshDeserialize,
{
    if data.len() < DISCRIMINATOR_LEN {
        return Err(ProgramClientError::AccountTooSmall(data.len()));
    }
    if data[..DISCRIMINATOR_LEN] != account_discriminator(name) {
        return Err(ProgramClientError::DiscriminatorMismatch(name.to_string()));
    }

    let mut body = &data[DISCRIMINATOR_LEN..];
    T::deserialize(&mut body).map_err(|source| ProgramClientError::Decode {
        name: name.to_string(),
        source,
    })
}

// Encode an account the way the program stores it
pub fn encode_account<T>(name: &str, account: &T) -> Result<Vec<u8>, ProgramClientError>
where
    T: BorshSerialize,
{
    let mut data = account_discriminator(name).to_vec();
    account
        .serialize(&mut data)
        .map_err(|source| ProgramClientError::Serialize { name: name.to_string(), source })?;
    Ok(data)
}

// Every event of the named type found in `Program data:` log lines
pub fn decode_events<T, S>(name: &str, logs: &[S]) -> Vec<T>
where
    T: BorshDeserialize,
    S: AsRef<str>,
{
    let wanted = event_discriminator(name);

    logs.iter()
        .filter_map(|line| line.as_ref().strip_prefix(PROGRAM_DATA_PREFIX))
        .filter_map(|encoded| base64::engine::general_purpose::STANDARD.decode(encoded.trim()).ok())
        .filter(|bytes| bytes.len() >= DISCRIMINATOR_LEN && bytes[..DISCRIMINATOR_LEN] == wanted)
        .filter_map(|bytes| T::deserialize(&mut &bytes[DISCRIMINATOR_LEN..]).ok())
        .collect()
}
