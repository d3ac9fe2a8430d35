// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/lib.rs
// Version: 1.0.0
//
// This file serves as the main library entry point for the pocket miner,
// located at the root of the source tree. It exports all public modules
// and types that the binary and the integration tests use.
//
// Tree Location:
// - src/lib.rs (root library file)
// - Exports modules: core, miner, node, pool, utils

pub mod core;
pub mod miner;
pub mod node;
pub mod pool;
pub mod utils;

// Re-export commonly used types at the crate root for convenience
pub use crate::core::{MinerError, MiningConfig, NetworkMode, ThreadCount};
pub use crate::miner::{Session, ThroughputAggregator, WorkController};
pub use crate::pool::{CandidateList, FailoverController, ServerFinder};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
