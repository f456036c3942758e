//! Instruction builders for the token-launch program.
//!
//! Instruction data is the Anchor global sighash
//! (`sha256("global:<name>")[..8]`) followed by borsh-encoded args. The
//! account orders below are the program's declared schema; reordering or
//! substituting a role produces a request the program rejects outright.
//!
//! Every builder takes [`DerivedAddress`] inputs and refuses to build while
//! any required account is unavailable, so a placeholder can never reach the
//! transport.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::{system_program, sysvar};

use crate::error::ClientError;
use crate::pda::{DerivedAddress, TOKEN_METADATA_PROGRAM_ID};

/// Metadata string limits enforced by the remote schema.
pub const MAX_NAME_LEN: usize = 32;
pub const MAX_SYMBOL_LEN: usize = 10;
pub const MAX_URI_LEN: usize = 200;

/// Anchor global instruction discriminator.
pub fn sighash(name: &str) -> [u8; 8] {
    let digest = solana_sdk::hash::hash(format!("global:{name}").as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&digest.to_bytes()[..8]);
    discriminator
}

fn encode(name: &str, args: &impl BorshSerialize) -> Result<Vec<u8>, ClientError> {
    let mut data = sighash(name).to_vec();
    let body = borsh::to_vec(args).map_err(|err| ClientError::Encoding(err.to_string()))?;
    data.extend_from_slice(&body);
    Ok(data)
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
struct NoArgs;

/// Metadata for `create_token`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateTokenArgs {
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

impl CreateTokenArgs {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            uri: uri.into(),
        }
    }

    /// Enforce the schema's string limits before anything is submitted.
    pub fn validate(&self) -> Result<(), ClientError> {
        for (field, value, limit) in [
            ("name", &self.name, MAX_NAME_LEN),
            ("symbol", &self.symbol, MAX_SYMBOL_LEN),
            ("uri", &self.uri, MAX_URI_LEN),
        ] {
            if value.is_empty() {
                return Err(ClientError::Precondition(format!("token {field} is empty")));
            }
            if value.len() > limit {
                return Err(ClientError::Precondition(format!(
                    "token {field} exceeds {limit} bytes"
                )));
            }
        }
        Ok(())
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
struct MintTokenArgs {
    amount: u64,
}

/// `initialize`: create the per-owner token state record.
///
/// Accounts: payer (signer, writable), token_state (writable), system
/// program.
pub fn initialize(
    program_id: &Pubkey,
    payer: &DerivedAddress,
    token_state: &DerivedAddress,
) -> Result<Instruction, ClientError> {
    let payer = payer.require("payer")?;
    let token_state = token_state.require("token state")?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(payer, true),
            AccountMeta::new(token_state, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: encode("initialize", &NoArgs)?,
    })
}

/// `create_token`: create the mint and its metadata record.
///
/// Accounts: payer (signer, writable), token_state (writable), mint
/// (writable), metadata (writable), token program, token metadata program,
/// system program, rent sysvar.
pub fn create_token(
    program_id: &Pubkey,
    payer: &DerivedAddress,
    token_state: &DerivedAddress,
    mint: &DerivedAddress,
    metadata: &DerivedAddress,
    args: &CreateTokenArgs,
) -> Result<Instruction, ClientError> {
    args.validate()?;
    let payer = payer.require("payer")?;
    let token_state = token_state.require("token state")?;
    let mint = mint.require("mint")?;
    let metadata = metadata.require("metadata")?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(payer, true),
            AccountMeta::new(token_state, false),
            AccountMeta::new(mint, false),
            AccountMeta::new(metadata, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(TOKEN_METADATA_PROGRAM_ID, false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ],
        data: encode("create_token", args)?,
    })
}

/// `mint_token`: mint whole-token units to the holder's associated account,
/// creating it if needed. The program scales by the mint's decimals.
///
/// Accounts: payer (signer, writable), token_state (writable), mint
/// (writable), associated token account (writable), token program,
/// associated token program, system program.
pub fn mint_token(
    program_id: &Pubkey,
    payer: &DerivedAddress,
    token_state: &DerivedAddress,
    mint: &DerivedAddress,
    associated_token: &DerivedAddress,
    amount: u64,
) -> Result<Instruction, ClientError> {
    let payer = payer.require("payer")?;
    let token_state = token_state.require("token state")?;
    let mint = mint.require("mint")?;
    let associated_token = associated_token.require("associated token")?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(payer, true),
            AccountMeta::new(token_state, false),
            AccountMeta::new(mint, false),
            AccountMeta::new(associated_token, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: encode("mint_token", &MintTokenArgs { amount })?,
    })
}
