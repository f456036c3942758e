//! # Balance Module
//!
//! Resolves a holder's balance for a mint through the associated token
//! account. Total over valid inputs: a holder with no associated account yet
//! has a balance of zero, not an error, so callers never special-case the
//! routine "account does not exist" state.

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use tracing::debug;

use crate::error::ClientError;
use crate::rpc::LedgerRpc;

pub struct BalanceResolver {
    ledger: Arc<dyn LedgerRpc>,
}

impl BalanceResolver {
    pub fn new(ledger: Arc<dyn LedgerRpc>) -> Self {
        Self { ledger }
    }

    /// UI-scaled balance of `holder` for `mint`.
    ///
    /// Derives the associated account, probes existence, and reads the
    /// chain-reported amount. Absence at either step degrades to `0.0`.
    pub async fn resolve(&self, mint: &Pubkey, holder: &Pubkey) -> Result<f64, ClientError> {
        let associated = get_associated_token_address(holder, mint);

        if self.ledger.get_account_data(&associated).await?.is_none() {
            debug!(%associated, "no associated account yet, balance is zero");
            return Ok(0.0);
        }

        // The account can race away between probe and read; that is still a
        // zero balance, not a failure.
        Ok(self
            .ledger
            .get_token_balance(&associated)
            .await?
            .unwrap_or(0.0))
    }
}
