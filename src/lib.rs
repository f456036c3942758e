//! # Minter Client
//!
//! Client library for the token-launch ledger program: derives the
//! program's deterministic state addresses, issues reads against them, and
//! sequences the write operations (initialize → createToken → mintToken)
//! while keeping a dependent-query cache consistent with on-chain truth.
//!
//! ## Architecture
//! The library is organized into modules:
//! - `config`: request-scoped cluster/program configuration
//! - `error`: the client error taxonomy
//! - `wallet`: the wallet-adapter seam (identity + signing capability)
//! - `pda`: pure, deterministic address derivation
//! - `rpc`: the ledger transport trait and its Solana RPC implementation
//! - `program`: account layouts, instruction builders, and the program client
//! - `cache`: the dependent-query cache with single-flight fetches
//! - `balance`: total balance resolution through associated accounts
//! - `mutations`: the mutation orchestrator and its state machines
//!
//! Derivation is synchronous and pure; everything that touches the ledger is
//! async and suspends on a tokio runtime without blocking other in-flight
//! operations.

pub mod balance;
pub mod cache;
pub mod config;
pub mod error;
pub mod mutations;
pub mod pda;
pub mod program;
pub mod rpc;
pub mod wallet;

pub use balance::BalanceResolver;
pub use cache::{QueryCache, QueryKey, QueryStatus};
pub use config::ClientConfig;
pub use error::ClientError;
pub use mutations::{MutationKind, MutationObserver, MutationOrchestrator, MutationState};
pub use pda::{AddressBook, DerivedAddress};
pub use program::{CreateTokenArgs, ProgramClient, TokenState};
pub use rpc::{LedgerRpc, SolanaLedger};
pub use wallet::{SessionSigner, WalletSession};
