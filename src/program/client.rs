//! Program client: reads program accounts and submits signed instructions
//! through the configured transport.

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;
use solana_sdk::instruction::Instruction;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::program::accounts::TokenState;
use crate::rpc::{LedgerRpc, SolanaLedger};

/// Client for one program deployment over one transport.
pub struct ProgramClient {
    config: ClientConfig,
    ledger: Arc<dyn LedgerRpc>,
}

impl ProgramClient {
    pub fn new(config: ClientConfig, ledger: Arc<dyn LedgerRpc>) -> Self {
        Self { config, ledger }
    }

    /// Connect over the Solana JSON-RPC endpoint from the configuration.
    pub fn connect(config: ClientConfig) -> Self {
        let ledger = Arc::new(SolanaLedger::from_config(&config));
        Self::new(config, ledger)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn ledger(&self) -> Arc<dyn LedgerRpc> {
        Arc::clone(&self.ledger)
    }

    /// Fetch and decode the token state record at `address`.
    ///
    /// A missing account is `Ok(None)`; only transport failures and
    /// malformed data are errors.
    pub async fn read_token_state(
        &self,
        address: &Pubkey,
    ) -> Result<Option<TokenState>, ClientError> {
        match self.ledger.get_account_data(address).await? {
            None => {
                debug!(%address, "token state not yet created");
                Ok(None)
            }
            Some(data) => TokenState::try_deserialize(address, &data).map(Some),
        }
    }

    /// Sign one instruction with the payer and submit it.
    ///
    /// The payer is `Send + Sync` so submission futures can move across
    /// tasks. Success means the transport confirmed the transaction at its
    /// configured commitment; callers must not assume finality beyond that.
    pub async fn submit(
        &self,
        payer: &(dyn Signer + Send + Sync),
        instruction: Instruction,
    ) -> Result<Signature, ClientError> {
        let blockhash = self.ledger.latest_blockhash().await?;
        let payer_pubkey = payer.pubkey();
        let transaction = {
            let signers: Vec<&dyn Signer> = vec![payer];
            Transaction::new_signed_with_payer(
                &[instruction],
                Some(&payer_pubkey),
                &signers,
                blockhash,
            )
        };
        let signature = self.ledger.send_transaction(&transaction).await?;
        info!(%signature, payer = %payer_pubkey, "instruction submitted");
        Ok(signature)
    }
}
