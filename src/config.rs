//! # Configuration Module
//!
//! Request-scoped client configuration: target cluster, program id, and
//! commitment level.
//!
//! The configuration is created by the caller (typically once per wallet
//! session) and threaded into every component. There is intentionally no
//! process-wide `CONFIG` singleton: the program id varies by cluster, and a
//! cluster switch must produce a fresh context rather than mutate shared
//! state.

use std::env;
use std::str::FromStr;

use anchor_client::Cluster;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;

use crate::error::ClientError;

/// Program id declared by the on-chain program (testnet/mainnet deployments).
pub const DEFAULT_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("7rqSkHiGHGJEbTNsQsDKEfkdxdqcx9EyTPdKW3Vju7um");

/// Devnet deployment of the program.
pub const DEVNET_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("EcGhLkbDw9rWoJXgwfQiJEy32THQftmVY3mQwKxY6xk1");

/// Resolve the deployed program id for a cluster.
pub fn program_id_for(cluster: &Cluster) -> Pubkey {
    match cluster {
        Cluster::Devnet => DEVNET_PROGRAM_ID,
        _ => DEFAULT_PROGRAM_ID,
    }
}

/// Client configuration for one session against one cluster.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Target cluster (devnet, testnet, mainnet, or a custom endpoint).
    pub cluster: Cluster,
    /// Program id of the token-launch program on that cluster.
    pub program_id: Pubkey,
    /// Commitment level reads and submissions are confirmed at.
    pub commitment: CommitmentConfig,
    rpc_url: Option<String>,
}

impl ClientConfig {
    /// Configuration for a cluster with its default program deployment and
    /// `confirmed` commitment.
    pub fn new(cluster: Cluster) -> Self {
        let program_id = program_id_for(&cluster);
        Self {
            cluster,
            program_id,
            commitment: CommitmentConfig::confirmed(),
            rpc_url: None,
        }
    }

    /// Override the program id (e.g. a local test deployment).
    pub fn with_program_id(mut self, program_id: Pubkey) -> Self {
        self.program_id = program_id;
        self
    }

    /// Override the RPC endpoint while keeping the cluster label.
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Load configuration from environment variables, falling back to devnet.
    ///
    /// Recognized variables: `SOLANA_CLUSTER` (devnet/testnet/mainnet or a
    /// custom URL), `SOLANA_RPC_URL`, `PROGRAM_ID`.
    pub fn from_env() -> Result<Self, ClientError> {
        let cluster = match env::var("SOLANA_CLUSTER") {
            Ok(raw) => Cluster::from_str(&raw)
                .map_err(|e| ClientError::Config(format!("SOLANA_CLUSTER: {e}")))?,
            Err(_) => Cluster::Devnet,
        };

        let mut config = Self::new(cluster);

        if let Ok(raw) = env::var("PROGRAM_ID") {
            let program_id = Pubkey::from_str(&raw)
                .map_err(|e| ClientError::Config(format!("PROGRAM_ID: {e}")))?;
            config = config.with_program_id(program_id);
        }
        if let Ok(url) = env::var("SOLANA_RPC_URL") {
            config = config.with_rpc_url(url);
        }

        Ok(config)
    }

    /// RPC endpoint for this configuration.
    pub fn rpc_url(&self) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| self.cluster.url().to_string())
    }

    /// Stable label embedded in every cache key. Two configurations with
    /// different labels can never share cache entries.
    pub fn cluster_label(&self) -> String {
        match &self.cluster {
            Cluster::Devnet => "devnet".to_string(),
            Cluster::Testnet => "testnet".to_string(),
            Cluster::Mainnet => "mainnet".to_string(),
            Cluster::Localnet => "localnet".to_string(),
            Cluster::Debug => "debug".to_string(),
            Cluster::Custom(url, _) => url.clone(),
        }
    }
}
