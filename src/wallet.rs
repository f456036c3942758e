//! # Wallet Module
//!
//! The wallet-adapter seam: a session that either carries a signing identity
//! or is disconnected. Every identity-dependent derivation and cache entry is
//! keyed off [`WalletSession::identity`], so replacing the session is enough
//! to invalidate the whole derivation chain.

use std::fmt;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;

use crate::error::ClientError;

/// A shareable signing capability supplied by the wallet collaborator.
pub type SessionSigner = Arc<dyn Signer + Send + Sync>;

/// Current wallet state: connected with a signer, or disconnected.
#[derive(Clone, Default)]
pub struct WalletSession {
    signer: Option<SessionSigner>,
}

impl WalletSession {
    pub fn connected(signer: SessionSigner) -> Self {
        Self { signer: Some(signer) }
    }

    pub fn disconnected() -> Self {
        Self { signer: None }
    }

    /// The authenticated actor's public address, if connected.
    pub fn identity(&self) -> Option<Pubkey> {
        self.signer.as_ref().map(|s| s.pubkey())
    }

    pub fn is_connected(&self) -> bool {
        self.signer.is_some()
    }

    /// The signing capability, or a precondition error when disconnected.
    pub fn signer(&self) -> Result<SessionSigner, ClientError> {
        self.signer
            .clone()
            .ok_or_else(|| ClientError::precondition("wallet not connected"))
    }
}

impl fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity() {
            Some(identity) => write!(f, "WalletSession({identity})"),
            None => write!(f, "WalletSession(disconnected)"),
        }
    }
}
