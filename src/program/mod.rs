//! # Program Module
//!
//! The off-chain side of the token-launch program: account layouts,
//! instruction builders matching the program's wire schema, and the client
//! that issues reads and submissions.

pub mod accounts;
pub mod client;
pub mod instructions;

pub use accounts::TokenState;
pub use client::ProgramClient;
pub use instructions::{CreateTokenArgs, MAX_NAME_LEN, MAX_SYMBOL_LEN, MAX_URI_LEN};
