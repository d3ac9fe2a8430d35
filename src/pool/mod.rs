// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/pool/mod.rs
// Version: 1.0.0
//
// This file is the module declaration for the pool functionality of the
// miner, located in the pool subdirectory: ranking pool servers, holding the
// TCP connection and failing over between servers.
//
// Tree Location:
// - src/pool/mod.rs (pool module entry point)
// - Submodules: client, failover, finder

pub mod client;
pub mod failover;
pub mod finder;

// Re-export key types for convenience
pub use client::{TcpPoolConnection, TcpProbe};
pub use failover::{Backoff, ConnectionState, FailoverController, PoolConnection};
pub use finder::{CandidateList, Probe, ServerCandidate, ServerFinder};
