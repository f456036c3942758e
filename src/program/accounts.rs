//! On-chain account layouts mirrored client-side.
//!
//! Anchor account data is an 8-byte discriminator followed by the borsh-
//! encoded fields. The structs also derive serde so fetched records can be
//! stored as JSON cache values.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::ClientError;

/// Anchor account discriminator: first 8 bytes of `sha256("account:<Name>")`.
pub fn account_discriminator(name: &str) -> [u8; 8] {
    let digest = solana_sdk::hash::hash(format!("account:{name}").as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&digest.to_bytes()[..8]);
    discriminator
}

/// Per-owner state record gating createToken and mintToken.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq,
)]
pub struct TokenState {
    /// Wallet that initialized this record; part of its PDA seeds.
    pub owner: Pubkey,
    pub bump: u8,
    /// Whether the mint and metadata accounts have been created.
    pub token_created: bool,
    /// Whole-token units minted so far through this state record.
    pub total_minted: u64,
}

impl TokenState {
    pub fn discriminator() -> [u8; 8] {
        account_discriminator("TokenState")
    }

    /// Decode fetched account data, verifying the discriminator.
    pub fn try_deserialize(address: &Pubkey, data: &[u8]) -> Result<Self, ClientError> {
        if data.len() < 8 || data[..8] != Self::discriminator() {
            return Err(ClientError::MalformedAccount {
                address: address.to_string(),
                reason: "token state discriminator mismatch".into(),
            });
        }
        Self::try_from_slice(&data[8..]).map_err(|err| ClientError::MalformedAccount {
            address: address.to_string(),
            reason: err.to_string(),
        })
    }

    /// Encode as full account data (discriminator + body). Used by fixtures
    /// and fake ledgers.
    pub fn to_account_data(&self) -> Result<Vec<u8>, ClientError> {
        let mut data = Self::discriminator().to_vec();
        let body = borsh::to_vec(self).map_err(|err| ClientError::Encoding(err.to_string()))?;
        data.extend_from_slice(&body);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_account_data() {
        let state = TokenState {
            owner: Pubkey::new_unique(),
            bump: 254,
            token_created: true,
            total_minted: 41,
        };
        let address = Pubkey::new_unique();
        let data = state.to_account_data().unwrap();
        let decoded = TokenState::try_deserialize(&address, &data).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn rejects_wrong_discriminator() {
        let address = Pubkey::new_unique();
        let mut data = vec![0u8; 8];
        data.extend_from_slice(&[0u8; 64]);
        assert!(matches!(
            TokenState::try_deserialize(&address, &data),
            Err(ClientError::MalformedAccount { .. })
        ));
    }

    #[test]
    fn rejects_truncated_data() {
        let address = Pubkey::new_unique();
        assert!(matches!(
            TokenState::try_deserialize(&address, &[1, 2, 3]),
            Err(ClientError::MalformedAccount { .. })
        ));
    }
}
