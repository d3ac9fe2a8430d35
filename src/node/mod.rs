// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/node/mod.rs
// Version: 1.0.0
//
// This file declares the narrow interfaces the miner needs from the node:
// account balance lookups, the mempool size and the chain head for logging.
// Consensus and peer signals arrive as NodeEvent values on a channel.
//
// Tree Location:
// - src/node/mod.rs (node collaborator interfaces)
// - Submodules: standalone

pub mod standalone;

use crate::core::MinerError;
use async_trait::async_trait;

pub use standalone::StandaloneNode;

/// Account state at lookup time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountSnapshot {
    /// Balance in the smallest unit
    pub balance: u64,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fresh lookup; implementations must not serve a cached value
    async fn get(&self, address: &str) -> Result<AccountSnapshot, MinerError>;
}

#[async_trait]
pub trait Mempool: Send + Sync {
    async fn transaction_count(&self) -> Result<usize, MinerError>;
}

/// Read-only view of the chain head
pub trait ChainInfo: Send + Sync {
    fn height(&self) -> u32;
    fn head_hash(&self) -> String;
}
