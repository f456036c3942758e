//! Mutation kinds, per-kind state machine, and the notification seam.

use std::fmt;

use solana_sdk::signature::Signature;
use tracing::{error, info};

/// The three write operations the program exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Initialize,
    CreateToken,
    MintToken,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::Initialize => "initialize",
            MutationKind::CreateToken => "createToken",
            MutationKind::MintToken => "mintToken",
        };
        f.write_str(name)
    }
}

/// State of one mutation kind.
///
/// `Failed` is sticky until the caller explicitly retries; there is no
/// automatic retry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Pending,
    Succeeded(Signature),
    Failed(String),
}

impl MutationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, MutationState::Pending)
    }
}

/// User-visible notification seam for mutation outcomes.
pub trait MutationObserver: Send + Sync {
    fn on_success(&self, kind: MutationKind, signature: &Signature);
    fn on_error(&self, kind: MutationKind, message: &str);
}

/// Default observer: structured log lines instead of UI toasts.
pub struct LogObserver;

impl MutationObserver for LogObserver {
    fn on_success(&self, kind: MutationKind, signature: &Signature) {
        info!(%kind, %signature, "mutation succeeded");
    }

    fn on_error(&self, kind: MutationKind, message: &str) {
        error!(%kind, message, "mutation failed");
    }
}
