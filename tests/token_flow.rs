//! End-to-end flow tests over a fake ledger transport.
//!
//! `MockLedger` implements the transport trait with an in-memory account
//! map and applies the program's instruction semantics when a transaction is
//! sent, so the full orchestration path (derive → precondition → submit →
//! invalidate → refetch) runs without a validator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anchor_client::Cluster;
use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;

use minter_client::program::instructions::sighash;
use minter_client::{
    BalanceResolver, ClientConfig, ClientError, CreateTokenArgs, LedgerRpc, MutationKind,
    MutationOrchestrator, MutationState, ProgramClient, TokenState, WalletSession,
};

struct MockLedger {
    program_id: Pubkey,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    balances: Mutex<HashMap<Pubkey, f64>>,
    sends: AtomicUsize,
    send_delay: Option<Duration>,
    read_delay: Option<Duration>,
}

impl MockLedger {
    fn empty(program_id: Pubkey) -> Self {
        Self {
            program_id,
            accounts: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            sends: AtomicUsize::new(0),
            send_delay: None,
            read_delay: None,
        }
    }

    fn new(program_id: Pubkey) -> Arc<Self> {
        Arc::new(Self::empty(program_id))
    }

    fn with_send_delay(program_id: Pubkey, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            send_delay: Some(delay),
            ..Self::empty(program_id)
        })
    }

    fn with_read_delay(program_id: Pubkey, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            read_delay: Some(delay),
            ..Self::empty(program_id)
        })
    }

    fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    fn seed_token_state(&self, address: Pubkey, state: &TokenState) {
        self.accounts
            .lock()
            .insert(address, state.to_account_data().unwrap());
    }

    fn read_state(&self, address: &Pubkey) -> Option<TokenState> {
        let accounts = self.accounts.lock();
        let data = accounts.get(address)?;
        Some(TokenState::try_deserialize(address, data).unwrap())
    }

    fn apply(&self, transaction: &Transaction) -> Result<(), ClientError> {
        let message = &transaction.message;
        for instruction in &message.instructions {
            let program = message.account_keys[instruction.program_id_index as usize];
            if program != self.program_id {
                continue;
            }
            let keys: Vec<Pubkey> = instruction
                .accounts
                .iter()
                .map(|index| message.account_keys[*index as usize])
                .collect();
            let data = &instruction.data;

            if data[..8] == sighash("initialize") {
                let (payer, token_state) = (keys[0], keys[1]);
                let mut accounts = self.accounts.lock();
                if accounts.contains_key(&token_state) {
                    return Err(ClientError::Transport("account already in use".into()));
                }
                let state = TokenState {
                    owner: payer,
                    bump: 255,
                    token_created: false,
                    total_minted: 0,
                };
                accounts.insert(token_state, state.to_account_data().unwrap());
            } else if data[..8] == sighash("create_token") {
                let token_state = keys[1];
                let mut state = self
                    .read_state(&token_state)
                    .ok_or_else(|| ClientError::Transport("token state missing".into()))?;
                state.token_created = true;
                self.accounts
                    .lock()
                    .insert(token_state, state.to_account_data().unwrap());
            } else if data[..8] == sighash("mint_token") {
                let (token_state, associated) = (keys[1], keys[3]);
                let amount = u64::from_le_bytes(data[8..16].try_into().unwrap());
                let mut state = self
                    .read_state(&token_state)
                    .ok_or_else(|| ClientError::Transport("token state missing".into()))?;
                if !state.token_created {
                    return Err(ClientError::Transport("mint not created".into()));
                }
                state.total_minted += amount;
                self.accounts
                    .lock()
                    .insert(token_state, state.to_account_data().unwrap());
                // init_if_needed: the associated account comes into existence
                // on first mint.
                self.accounts.lock().entry(associated).or_insert_with(|| vec![1]);
                *self.balances.lock().entry(associated).or_insert(0.0) += amount as f64;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError> {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.accounts.lock().get(address).cloned())
    }

    async fn get_token_balance(&self, address: &Pubkey) -> Result<Option<f64>, ClientError> {
        Ok(self.balances.lock().get(address).copied())
    }

    async fn latest_blockhash(&self) -> Result<Hash, ClientError> {
        Ok(Hash::default())
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, ClientError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        self.apply(transaction)?;
        Ok(Signature::default())
    }
}

fn devnet_config() -> ClientConfig {
    ClientConfig::new(Cluster::Devnet)
}

fn orchestrator_over(
    config: ClientConfig,
    ledger: Arc<MockLedger>,
) -> (MutationOrchestrator, Pubkey) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let wallet = Keypair::new();
    let identity = wallet.pubkey();
    let session = WalletSession::connected(Arc::new(wallet));
    let client = ProgramClient::new(config, ledger);
    (MutationOrchestrator::new(client, session), identity)
}

#[tokio::test]
async fn full_launch_flow() {
    let config = devnet_config();
    let ledger = MockLedger::new(config.program_id);
    let (orchestrator, identity) = orchestrator_over(config, ledger.clone());

    // Nothing on chain yet.
    assert_eq!(orchestrator.token_state().await.unwrap(), None);

    orchestrator.initialize().await.unwrap();
    let state = orchestrator.token_state().await.unwrap().unwrap();
    assert_eq!(state.owner, identity);
    assert!(!state.token_created);

    orchestrator
        .create_token(CreateTokenArgs::new("Foo", "FOO", "https://x/y.json"))
        .await
        .unwrap();
    let state = orchestrator.token_state().await.unwrap().unwrap();
    assert!(state.token_created);

    assert_eq!(orchestrator.balance().await.unwrap(), 0.0);
    orchestrator.mint_token(5).await.unwrap();
    assert_eq!(orchestrator.balance().await.unwrap(), 5.0);

    assert_eq!(ledger.sends(), 3);
    assert!(matches!(
        orchestrator.mutation_state(MutationKind::MintToken),
        MutationState::Succeeded(_)
    ));
}

#[tokio::test]
async fn create_token_rejected_before_initialize() {
    let config = devnet_config();
    let ledger = MockLedger::new(config.program_id);
    let (orchestrator, _) = orchestrator_over(config, ledger.clone());

    // The snapshot resolves to "absent".
    assert_eq!(orchestrator.token_state().await.unwrap(), None);

    let err = orchestrator
        .create_token(CreateTokenArgs::new("Foo", "FOO", "https://x/y.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Precondition(_)));
    assert_eq!(ledger.sends(), 0, "no transport call may be issued");
    assert_eq!(
        orchestrator.mutation_state(MutationKind::CreateToken),
        MutationState::Idle
    );
}

#[tokio::test]
async fn initialize_rejected_when_record_already_present() {
    let config = devnet_config();
    let ledger = MockLedger::new(config.program_id);
    let (orchestrator, identity) = orchestrator_over(config, ledger.clone());

    let token_state = orchestrator.addresses().token_state.known().unwrap();
    ledger.seed_token_state(
        token_state,
        &TokenState {
            owner: identity,
            bump: 255,
            token_created: false,
            total_minted: 0,
        },
    );
    assert!(orchestrator.token_state().await.unwrap().is_some());

    let sends_before = ledger.sends();
    let err = orchestrator.initialize().await.unwrap_err();
    assert!(matches!(err, ClientError::Precondition(_)));
    assert_eq!(ledger.sends(), sends_before);
}

#[tokio::test]
async fn duplicate_mint_rejected_while_pending() {
    let config = devnet_config();
    let ledger = MockLedger::with_send_delay(config.program_id, Duration::from_millis(50));
    let (orchestrator, identity) = orchestrator_over(config, ledger.clone());
    let orchestrator = Arc::new(orchestrator);

    let token_state = orchestrator.addresses().token_state.known().unwrap();
    ledger.seed_token_state(
        token_state,
        &TokenState {
            owner: identity,
            bump: 255,
            token_created: true,
            total_minted: 0,
        },
    );

    let background = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.mint_token(5).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(orchestrator
        .mutation_state(MutationKind::MintToken)
        .is_pending());
    let err = orchestrator.mint_token(1).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::AlreadyInProgress(MutationKind::MintToken)
    ));

    background.await.unwrap().unwrap();
    assert_eq!(ledger.sends(), 1, "the duplicate issued no transport call");
    assert_eq!(orchestrator.balance().await.unwrap(), 5.0);
}

#[tokio::test]
async fn mint_refreshes_the_token_state_record() {
    let config = devnet_config();
    let ledger = MockLedger::new(config.program_id);
    let (orchestrator, identity) = orchestrator_over(config, ledger.clone());

    let token_state = orchestrator.addresses().token_state.known().unwrap();
    ledger.seed_token_state(
        token_state,
        &TokenState {
            owner: identity,
            bump: 255,
            token_created: true,
            total_minted: 0,
        },
    );

    // Populate the cache with the pre-mint record.
    assert_eq!(
        orchestrator.token_state().await.unwrap().unwrap().total_minted,
        0
    );

    orchestrator.mint_token(5).await.unwrap();

    // Both dependent queries reflect the mint without manual invalidation.
    assert_eq!(
        orchestrator.token_state().await.unwrap().unwrap().total_minted,
        5
    );
    assert_eq!(orchestrator.balance().await.unwrap(), 5.0);
}

#[tokio::test]
async fn disconnect_discards_an_in_flight_fetch() {
    let config = devnet_config();
    let ledger = MockLedger::with_read_delay(config.program_id, Duration::from_millis(50));
    let (orchestrator, identity) = orchestrator_over(config, ledger.clone());
    let orchestrator = Arc::new(orchestrator);

    let token_state = orchestrator.addresses().token_state.known().unwrap();
    ledger.seed_token_state(
        token_state,
        &TokenState {
            owner: identity,
            bump: 255,
            token_created: false,
            total_minted: 0,
        },
    );

    let background = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.token_state().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    orchestrator.disconnect_wallet();
    assert!(orchestrator.cache().is_empty());

    // The fetch that was in flight at disconnect lands afterwards; its
    // result must not repopulate the torn-down cache.
    background.await.unwrap().unwrap();
    assert!(orchestrator.cache().is_empty());
}

#[tokio::test]
async fn balance_is_zero_without_associated_account() {
    let ledger = MockLedger::new(Pubkey::new_unique());
    let resolver = BalanceResolver::new(ledger);

    let amount = resolver
        .resolve(&Pubkey::new_unique(), &Pubkey::new_unique())
        .await
        .unwrap();
    assert_eq!(amount, 0.0);
}

#[tokio::test]
async fn disconnect_tears_down_cache_and_derivations() {
    let config = devnet_config();
    let ledger = MockLedger::new(config.program_id);
    let (orchestrator, _) = orchestrator_over(config, ledger);

    orchestrator.token_state().await.unwrap();
    assert!(!orchestrator.cache().is_empty());

    orchestrator.disconnect_wallet();
    assert!(orchestrator.cache().is_empty());
    assert!(!orchestrator.addresses().token_state.is_known());
    assert!(matches!(
        orchestrator.token_state().await,
        Err(ClientError::Precondition(_))
    ));

    // Reconnecting restores the whole chain without rebuilding anything.
    orchestrator.connect_wallet(Arc::new(Keypair::new()));
    assert!(orchestrator.addresses().token_state.is_known());
    assert!(orchestrator.addresses().mint.is_known());
    assert!(orchestrator.addresses().metadata.is_known());
}

#[tokio::test]
async fn cluster_switch_resets_the_cache() {
    let config = devnet_config();
    let ledger = MockLedger::new(config.program_id);
    let (mut orchestrator, _) = orchestrator_over(config, ledger);

    orchestrator.token_state().await.unwrap();
    assert!(!orchestrator.cache().is_empty());

    let testnet = ClientConfig::new(Cluster::Testnet);
    let testnet_ledger = MockLedger::new(testnet.program_id);
    orchestrator.switch_context(ProgramClient::new(testnet, testnet_ledger));

    assert!(orchestrator.cache().is_empty());
    assert_eq!(orchestrator.config().cluster_label(), "testnet");
    assert_eq!(
        orchestrator.mutation_state(MutationKind::Initialize),
        MutationState::Idle
    );
}
