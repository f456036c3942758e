//! The mutation orchestrator: the top-level handle UI code drives.
//!
//! Owns the program client, the query cache, and the wallet session. Exposes
//! the dependent queries (token state, balance) and the three mutations,
//! with at most one in-flight attempt per mutation kind. Preconditions are
//! evaluated synchronously against the current cache snapshot; the snapshot
//! may be stale by the time the transaction lands, and the program itself is
//! the final arbiter (every success is followed by invalidation and an eager
//! refetch rather than client-side optimism).

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tracing::{debug, warn};

use crate::balance::BalanceResolver;
use crate::cache::{QueryCache, QueryKey};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::mutations::state::{LogObserver, MutationKind, MutationObserver, MutationState};
use crate::pda::{self, AddressBook, DerivedAddress};
use crate::program::instructions;
use crate::program::{CreateTokenArgs, ProgramClient, TokenState};
use crate::wallet::{SessionSigner, WalletSession};

/// Cache operation names, part of every cache key.
const TOKEN_STATE_OP: &str = "tokenState";
const TOKEN_BALANCE_OP: &str = "tokenBalance";

/// Sets the slot to `Pending` on creation and restores `Idle` on drop unless
/// the mutation reached a terminal state. A future dropped mid-flight
/// therefore cannot wedge the state machine.
struct FlightGuard<'a> {
    states: &'a DashMap<MutationKind, MutationState>,
    kind: MutationKind,
    finished: bool,
}

impl<'a> FlightGuard<'a> {
    fn finish(mut self, state: MutationState) {
        self.states.insert(self.kind, state);
        self.finished = true;
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.states.insert(self.kind, MutationState::Idle);
        }
    }
}

pub struct MutationOrchestrator {
    client: ProgramClient,
    cache: Arc<QueryCache>,
    session: RwLock<WalletSession>,
    states: DashMap<MutationKind, MutationState>,
    observer: Arc<dyn MutationObserver>,
}

impl MutationOrchestrator {
    /// Orchestrator over the Solana RPC endpoint from the configuration.
    pub fn connect(config: ClientConfig, session: WalletSession) -> Self {
        Self::new(ProgramClient::connect(config), session)
    }

    /// Orchestrator over an explicit client (tests inject a mock transport
    /// here).
    pub fn new(client: ProgramClient, session: WalletSession) -> Self {
        Self {
            client,
            cache: Arc::new(QueryCache::new()),
            session: RwLock::new(session),
            states: DashMap::new(),
            observer: Arc::new(LogObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn MutationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        self.client.config()
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Current state of one mutation kind.
    pub fn mutation_state(&self, kind: MutationKind) -> MutationState {
        self.states
            .get(&kind)
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    /// Connected identity, if any.
    pub fn identity(&self) -> Option<Pubkey> {
        self.session.read().identity()
    }

    /// Attach a wallet. The derivation chain changes with the identity, so
    /// the cache is reset.
    pub fn connect_wallet(&self, signer: SessionSigner) {
        *self.session.write() = WalletSession::connected(signer);
        self.cache.clear();
        debug!("wallet connected, cache reset");
    }

    /// Drop the wallet: every identity-dependent address becomes unavailable
    /// and every cache entry is torn down.
    pub fn disconnect_wallet(&self) {
        *self.session.write() = WalletSession::disconnected();
        self.cache.clear();
        debug!("wallet disconnected, cache reset");
    }

    /// Retarget the orchestrator at another cluster/program: re-derives every
    /// address and resets the cache and mutation slots.
    pub fn switch_context(&mut self, client: ProgramClient) {
        self.client = client;
        self.cache.clear();
        self.states.clear();
    }

    /// The derivation chain for the current identity, recomputed on demand.
    pub fn addresses(&self) -> AddressBook {
        AddressBook::derive(self.identity(), &self.client.config().program_id)
    }

    fn token_state_key(&self) -> Option<QueryKey> {
        let book = self.addresses();
        QueryKey::try_new(
            TOKEN_STATE_OP,
            &self.client.config().cluster_label(),
            &[&book.token_state],
        )
    }

    fn balance_key(&self) -> Option<QueryKey> {
        let book = self.addresses();
        let holder = DerivedAddress::from(self.identity());
        QueryKey::try_new(
            TOKEN_BALANCE_OP,
            &self.client.config().cluster_label(),
            &[&book.mint, &holder],
        )
    }

    /// Dependent query: the token state record for the current identity.
    ///
    /// Disabled (precondition error) until the token state address is
    /// derivable; cached once fetched.
    pub async fn token_state(&self) -> Result<Option<TokenState>, ClientError> {
        let key = self
            .token_state_key()
            .ok_or_else(|| ClientError::precondition("token state address unavailable"))?;
        let address = self.addresses().token_state.require("token state")?;

        let value = self
            .cache
            .get_or_fetch(&key, || async move {
                let state = self.client.read_token_state(&address).await?;
                serde_json::to_value(&state).map_err(|err| ClientError::Encoding(err.to_string()))
            })
            .await?;
        serde_json::from_value(value).map_err(|err| ClientError::Encoding(err.to_string()))
    }

    /// Dependent query: the current identity's balance for the derived mint.
    ///
    /// Total once enabled: zero when no associated account exists yet.
    pub async fn balance(&self) -> Result<f64, ClientError> {
        let key = self
            .balance_key()
            .ok_or_else(|| ClientError::precondition("balance inputs unavailable"))?;
        let mint = self.addresses().mint.require("mint")?;
        let holder = DerivedAddress::from(self.identity()).require("holder")?;

        let value = self
            .cache
            .get_or_fetch(&key, || async move {
                let resolver = BalanceResolver::new(self.client.ledger());
                let amount = resolver.resolve(&mint, &holder).await?;
                Ok(Value::from(amount))
            })
            .await?;
        serde_json::from_value(value).map_err(|err| ClientError::Encoding(err.to_string()))
    }

    /// Reject a duplicate invocation while the same kind is pending.
    fn begin(&self, kind: MutationKind) -> Result<FlightGuard<'_>, ClientError> {
        {
            let mut slot = self.states.entry(kind).or_default();
            if slot.is_pending() {
                return Err(ClientError::AlreadyInProgress(kind));
            }
            *slot = MutationState::Pending;
        }
        Ok(FlightGuard {
            states: &self.states,
            kind,
            finished: false,
        })
    }

    async fn run_submit(
        &self,
        guard: FlightGuard<'_>,
        kind: MutationKind,
        signer: SessionSigner,
        instruction: solana_sdk::instruction::Instruction,
    ) -> Result<Signature, ClientError> {
        match self.client.submit(signer.as_ref(), instruction).await {
            Ok(signature) => {
                guard.finish(MutationState::Succeeded(signature));
                self.observer.on_success(kind, &signature);
                Ok(signature)
            }
            Err(err) => {
                let message = err.to_string();
                guard.finish(MutationState::Failed(message.clone()));
                self.observer.on_error(kind, &message);
                Err(err)
            }
        }
    }

    async fn refetch_token_state(&self) {
        if let Err(err) = self.token_state().await {
            warn!(%err, "token state refetch after mutation failed");
        }
    }

    /// `initialize`: create the per-owner token state record.
    ///
    /// Preconditions: identity known, token state address derivable, and the
    /// cache snapshot does not already show a present record.
    pub async fn initialize(&self) -> Result<Signature, ClientError> {
        let guard = self.begin(MutationKind::Initialize)?;

        let signer = self.session.read().signer()?;
        let book = self.addresses();
        let payer = DerivedAddress::from(self.identity());

        if let Some(key) = self.token_state_key() {
            if let Some(snapshot) = self.cache.peek(&key) {
                if snapshot.is_present() {
                    return Err(ClientError::precondition(
                        "token state already initialized",
                    ));
                }
            }
        }

        let instruction = instructions::initialize(
            &self.client.config().program_id,
            &payer,
            &book.token_state,
        )?;
        let signature = self
            .run_submit(guard, MutationKind::Initialize, signer, instruction)
            .await?;

        if let Some(key) = self.token_state_key() {
            self.cache.invalidate(&key);
        }
        self.refetch_token_state().await;
        Ok(signature)
    }

    /// `createToken`: create the mint and metadata records.
    ///
    /// Preconditions: the cache snapshot shows a present token state record
    /// (absent or unresolved rejects without a transport call), the metadata
    /// strings are within the schema limits, and the mint and metadata
    /// addresses are derivable.
    pub async fn create_token(&self, args: CreateTokenArgs) -> Result<Signature, ClientError> {
        let guard = self.begin(MutationKind::CreateToken)?;

        let signer = self.session.read().signer()?;
        let book = self.addresses();
        let payer = DerivedAddress::from(self.identity());

        let key = self
            .token_state_key()
            .ok_or_else(|| ClientError::precondition("token state address unavailable"))?;
        let initialized = self
            .cache
            .peek(&key)
            .map(|snapshot| snapshot.is_present())
            .unwrap_or(false);
        if !initialized {
            return Err(ClientError::precondition(
                "token state not initialized yet",
            ));
        }

        let instruction = instructions::create_token(
            &self.client.config().program_id,
            &payer,
            &book.token_state,
            &book.mint,
            &book.metadata,
            &args,
        )?;
        let signature = self
            .run_submit(guard, MutationKind::CreateToken, signer, instruction)
            .await?;

        self.cache.invalidate(&key);
        if let Some(mint) = book.mint.known() {
            self.cache.invalidate_where(|key| key.mentions(&mint));
        }
        self.refetch_token_state().await;
        Ok(signature)
    }

    /// `mintToken`: mint whole-token units to the identity's associated
    /// account, creating it on chain if needed.
    ///
    /// Preconditions: positive amount, mint known, associated account
    /// derivable.
    pub async fn mint_token(&self, amount: u64) -> Result<Signature, ClientError> {
        let guard = self.begin(MutationKind::MintToken)?;

        if amount == 0 {
            return Err(ClientError::precondition("mint amount must be positive"));
        }

        let signer = self.session.read().signer()?;
        let book = self.addresses();
        let payer = DerivedAddress::from(self.identity());
        let associated = pda::derive_associated_token(&book.mint, &payer);

        let instruction = instructions::mint_token(
            &self.client.config().program_id,
            &payer,
            &book.token_state,
            &book.mint,
            &associated,
            amount,
        )?;
        let signature = self
            .run_submit(guard, MutationKind::MintToken, signer, instruction)
            .await?;

        // The mint bumps total_minted on the state record, so both entries
        // are stale.
        if let Some(key) = self.balance_key() {
            self.cache.invalidate(&key);
        }
        if let Some(key) = self.token_state_key() {
            self.cache.invalidate(&key);
        }
        self.refetch_token_state().await;
        if let Err(err) = self.balance().await {
            warn!(%err, "balance refetch after mint failed");
        }
        Ok(signature)
    }
}
