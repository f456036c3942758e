//! # Error Module
//!
//! Error taxonomy for the client library.
//!
//! "Account not found" is deliberately absent from this enum: reads return
//! `Option<_>` because a missing account is a routine outcome, not a failure.
//! Derivation failures likewise degrade to [`crate::pda::DerivedAddress::Unavailable`]
//! at the derivation layer and only show up here when a caller insists on a
//! concrete address via `require`.

use crate::mutations::MutationKind;

/// Errors surfaced by the client library.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Malformed derivation input (empty or oversized seed component).
    #[error("invalid derivation seed: {0}")]
    InvalidSeed(String),

    /// A mutation or read was attempted before its required inputs were ready.
    #[error("precondition not met: {0}")]
    Precondition(String),

    /// A mutation of this kind is already pending; the duplicate call was
    /// rejected without issuing a transport call.
    #[error("{0} already in progress")]
    AlreadyInProgress(MutationKind),

    /// Account data at a derived address did not match the expected layout.
    #[error("malformed account data at {address}: {reason}")]
    MalformedAccount { address: String, reason: String },

    /// Local serialization failure while encoding instruction or cache data.
    #[error("encoding failure: {0}")]
    Encoding(String),

    /// Invalid or missing configuration input.
    #[error("configuration error: {0}")]
    Config(String),

    /// The underlying RPC call failed for network or chain-validation reasons.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ClientError {
    /// Wrap any transport-level failure, keeping the remote message intact
    /// for user-visible notifications.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        ClientError::Transport(err.to_string())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        ClientError::Precondition(msg.into())
    }
}
