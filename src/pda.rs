//! # PDA Module
//!
//! Deterministic address derivation for the token-launch program.
//!
//! Derivation is pure: the same seeds and program id always produce the same
//! address, with no network dependency. Seed ordering and encoding must match
//! the on-chain program byte for byte; a mismatch silently derives a
//! different address and every downstream operation targets the wrong
//! account. Seed labels are raw bytes, never length-prefixed or
//! null-terminated.
//!
//! The chain is `identity → token_state → mint → metadata`, plus the
//! associated token account for `(mint, holder)`. While any input is unknown
//! the result is [`DerivedAddress::Unavailable`] rather than a guess, and
//! callers must branch on it explicitly.

use std::fmt;

use solana_sdk::pubkey::{Pubkey, MAX_SEEDS, MAX_SEED_LEN};
use spl_associated_token_account::get_associated_token_address;
use tracing::warn;

use crate::error::ClientError;

/// Seed label for the per-owner token state record.
pub const TOKEN_STATE_SEED: &[u8] = b"token_state";

/// Seed label for the mint record, chained off the token state address.
pub const MINT_SEED: &[u8] = b"mint";

/// Seed label for the metadata record (owned by the metadata program).
pub const METADATA_SEED: &[u8] = b"metadata";

/// The external token metadata program that owns metadata PDAs.
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// An address that is either fully derived or not derivable yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedAddress {
    Known(Pubkey),
    Unavailable,
}

impl DerivedAddress {
    pub fn known(&self) -> Option<Pubkey> {
        match self {
            DerivedAddress::Known(address) => Some(*address),
            DerivedAddress::Unavailable => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, DerivedAddress::Known(_))
    }

    /// Insist on a concrete address, naming the account role in the error.
    pub fn require(&self, role: &str) -> Result<Pubkey, ClientError> {
        self.known()
            .ok_or_else(|| ClientError::Precondition(format!("{role} address unavailable")))
    }
}

impl From<Option<Pubkey>> for DerivedAddress {
    fn from(value: Option<Pubkey>) -> Self {
        match value {
            Some(address) => DerivedAddress::Known(address),
            None => DerivedAddress::Unavailable,
        }
    }
}

impl fmt::Display for DerivedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivedAddress::Known(address) => write!(f, "{address}"),
            DerivedAddress::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Derive a program address from validated seeds.
///
/// Rejects empty and oversized seed components up front so malformed input
/// surfaces as [`ClientError::InvalidSeed`] instead of a panic deep inside
/// the derivation routine.
pub fn derive(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8), ClientError> {
    if seeds.is_empty() {
        return Err(ClientError::InvalidSeed("empty seed tuple".into()));
    }
    if seeds.len() > MAX_SEEDS {
        return Err(ClientError::InvalidSeed(format!(
            "{} seed components exceeds the maximum of {MAX_SEEDS}",
            seeds.len()
        )));
    }
    for (index, seed) in seeds.iter().enumerate() {
        if seed.is_empty() {
            return Err(ClientError::InvalidSeed(format!(
                "seed component {index} is empty"
            )));
        }
        if seed.len() > MAX_SEED_LEN {
            return Err(ClientError::InvalidSeed(format!(
                "seed component {index} is {} bytes, limit is {MAX_SEED_LEN}",
                seed.len()
            )));
        }
    }
    Pubkey::try_find_program_address(seeds, program_id)
        .ok_or_else(|| ClientError::InvalidSeed("no valid bump for seed tuple".into()))
}

/// Contain a derivation failure at the point of computation: log it and
/// degrade to `Unavailable` so the UI can gate on availability.
fn derived_or_unavailable(result: Result<(Pubkey, u8), ClientError>) -> DerivedAddress {
    match result {
        Ok((address, _bump)) => DerivedAddress::Known(address),
        Err(err) => {
            warn!(%err, "address derivation failed");
            DerivedAddress::Unavailable
        }
    }
}

/// Token state PDA for an owner: seeds `("token_state", owner)`.
pub fn derive_token_state(owner: &DerivedAddress, program_id: &Pubkey) -> DerivedAddress {
    match owner.known() {
        Some(owner) => {
            derived_or_unavailable(derive(&[TOKEN_STATE_SEED, owner.as_ref()], program_id))
        }
        None => DerivedAddress::Unavailable,
    }
}

/// Mint PDA: seeds `("mint", token_state)`.
pub fn derive_mint(token_state: &DerivedAddress, program_id: &Pubkey) -> DerivedAddress {
    match token_state.known() {
        Some(state) => derived_or_unavailable(derive(&[MINT_SEED, state.as_ref()], program_id)),
        None => DerivedAddress::Unavailable,
    }
}

/// Metadata PDA: seeds `("metadata", metadata_program, mint)`, derived under
/// the metadata program id rather than the token-launch program.
pub fn derive_metadata(mint: &DerivedAddress) -> DerivedAddress {
    match mint.known() {
        Some(mint) => derived_or_unavailable(derive(
            &[
                METADATA_SEED,
                TOKEN_METADATA_PROGRAM_ID.as_ref(),
                mint.as_ref(),
            ],
            &TOKEN_METADATA_PROGRAM_ID,
        )),
        None => DerivedAddress::Unavailable,
    }
}

/// Associated token account for `(mint, holder)` per the associated-account
/// convention.
pub fn derive_associated_token(
    mint: &DerivedAddress,
    holder: &DerivedAddress,
) -> DerivedAddress {
    match (mint.known(), holder.known()) {
        (Some(mint), Some(holder)) => {
            DerivedAddress::Known(get_associated_token_address(&holder, &mint))
        }
        _ => DerivedAddress::Unavailable,
    }
}

/// The full derivation chain for one identity, recomputed whenever the
/// identity or program id changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressBook {
    pub token_state: DerivedAddress,
    pub mint: DerivedAddress,
    pub metadata: DerivedAddress,
}

impl AddressBook {
    pub fn derive(identity: Option<Pubkey>, program_id: &Pubkey) -> Self {
        let owner = DerivedAddress::from(identity);
        let token_state = derive_token_state(&owner, program_id);
        let mint = derive_mint(&token_state, program_id);
        let metadata = derive_metadata(&mint);
        Self {
            token_state,
            mint,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program_id() -> Pubkey {
        crate::config::DEFAULT_PROGRAM_ID
    }

    #[test]
    fn derivation_is_deterministic() {
        let owner = Pubkey::new_unique();
        let a = derive(&[TOKEN_STATE_SEED, owner.as_ref()], &program_id()).unwrap();
        let b = derive(&[TOKEN_STATE_SEED, owner.as_ref()], &program_id()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_programs_derive_different_addresses() {
        let owner = Pubkey::new_unique();
        let other_program = Pubkey::new_unique();
        let a = derive(&[TOKEN_STATE_SEED, owner.as_ref()], &program_id()).unwrap();
        let b = derive(&[TOKEN_STATE_SEED, owner.as_ref()], &other_program).unwrap();
        assert_ne!(a.0, b.0);
    }

    #[test]
    fn empty_and_oversized_seeds_are_rejected() {
        assert!(matches!(
            derive(&[], &program_id()),
            Err(ClientError::InvalidSeed(_))
        ));
        assert!(matches!(
            derive(&[b""], &program_id()),
            Err(ClientError::InvalidSeed(_))
        ));
        let oversized = [0u8; MAX_SEED_LEN + 1];
        assert!(matches!(
            derive(&[&oversized], &program_id()),
            Err(ClientError::InvalidSeed(_))
        ));
    }

    #[test]
    fn unavailability_propagates_through_the_chain() {
        let book = AddressBook::derive(None, &program_id());
        assert!(!book.token_state.is_known());
        assert!(!book.mint.is_known());
        assert!(!book.metadata.is_known());
        assert!(!derive_associated_token(&book.mint, &DerivedAddress::Unavailable).is_known());
    }

    #[test]
    fn identity_unlocks_the_whole_chain() {
        let identity = Pubkey::new_unique();
        let book = AddressBook::derive(Some(identity), &program_id());
        assert!(book.token_state.is_known());
        assert!(book.mint.is_known());
        assert!(book.metadata.is_known());

        let holder = DerivedAddress::Known(identity);
        assert!(derive_associated_token(&book.mint, &holder).is_known());
    }

    #[test]
    fn mint_is_chained_off_token_state() {
        let a = AddressBook::derive(Some(Pubkey::new_unique()), &program_id());
        let b = AddressBook::derive(Some(Pubkey::new_unique()), &program_id());
        // Different owners must get different mints; a bare constant seed
        // would collapse them into one.
        assert_ne!(a.mint, b.mint);
    }

    #[test]
    fn require_names_the_missing_role() {
        let err = DerivedAddress::Unavailable.require("mint").unwrap_err();
        assert!(matches!(err, ClientError::Precondition(ref msg) if msg.contains("mint")));
    }
}
