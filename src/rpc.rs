//! # RPC Module
//!
//! The ledger read/submission interface and its Solana implementation.
//!
//! [`LedgerRpc`] is the transport seam: production code talks to a
//! nonblocking [`RpcClient`], tests supply a mock. The trait treats a missing
//! account as `Ok(None)` rather than an error, so callers can never collapse
//! "not yet created" into a hard failure. Submission reports success at the
//! transport's confirmation level and nothing stronger.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Read and submission primitives against the ledger.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Raw account data at an address, or `None` when the chain reports no
    /// account there.
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError>;

    /// UI-scaled balance of a token account, or `None` when the account does
    /// not exist.
    async fn get_token_balance(&self, address: &Pubkey) -> Result<Option<f64>, ClientError>;

    async fn latest_blockhash(&self) -> Result<Hash, ClientError>;

    async fn send_transaction(&self, transaction: &Transaction)
        -> Result<Signature, ClientError>;
}

/// [`LedgerRpc`] backed by the Solana JSON-RPC endpoint from the session
/// configuration.
pub struct SolanaLedger {
    rpc: RpcClient,
    commitment: CommitmentConfig,
}

impl SolanaLedger {
    pub fn new(rpc_url: String, commitment: CommitmentConfig) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url, commitment),
            commitment,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.rpc_url(), config.commitment)
    }
}

#[async_trait]
impl LedgerRpc for SolanaLedger {
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(ClientError::transport)?;
        debug!(%address, found = response.value.is_some(), "account read");
        Ok(response.value.map(|account| account.data))
    }

    async fn get_token_balance(&self, address: &Pubkey) -> Result<Option<f64>, ClientError> {
        // Probe existence first: the balance call errors on a missing
        // account, and absence must stay a non-error outcome.
        let exists = self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(ClientError::transport)?
            .value
            .is_some();
        if !exists {
            return Ok(None);
        }

        let amount = self
            .rpc
            .get_token_account_balance(address)
            .await
            .map_err(ClientError::transport)?;
        let ui_amount = amount
            .ui_amount
            .or_else(|| amount.ui_amount_string.parse().ok())
            .unwrap_or(0.0);
        Ok(Some(ui_amount))
    }

    async fn latest_blockhash(&self) -> Result<Hash, ClientError> {
        self.rpc
            .get_latest_blockhash()
            .await
            .map_err(ClientError::transport)
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, ClientError> {
        let signature = self
            .rpc
            .send_and_confirm_transaction(transaction)
            .await
            .map_err(ClientError::transport)?;
        debug!(%signature, "transaction confirmed");
        Ok(signature)
    }
}
