// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/mod.rs
// Version: 1.0.0
//
// This file is the module declaration for the core functionality of the
// miner: configuration, shared types and the error taxonomy.

pub mod config;
pub mod error;
pub mod types;

// Re-export the most commonly used items
pub use config::{ConfigFile, load_config};
pub use error::MinerError;
pub use types::{
    Args, ConnectionId, DEFAULT_CONFIG_FILE, DEFAULT_POOL_PORT, DEFAULT_SERVERS, MinedBlock, MiningConfig,
    NetworkMode, NodeEvent, PoolEvent, ThreadCount, WorkEvent,
};
