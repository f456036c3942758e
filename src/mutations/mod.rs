//! # Mutations Module
//!
//! Sequencing of the three write operations (initialize, createToken,
//! mintToken): per-kind state machines with single-flight guards,
//! precondition checks against the current cache snapshot, and cache
//! invalidation plus eager refetch after every success.

pub mod orchestrator;
pub mod state;

pub use orchestrator::MutationOrchestrator;
pub use state::{LogObserver, MutationKind, MutationObserver, MutationState};
