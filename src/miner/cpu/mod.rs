// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/cpu/mod.rs
// Version: 1.0.0
//
// This file is the module declaration for the local CPU work engine.
//
// Tree Location:
// - src/miner/cpu/mod.rs (CPU engine module entry point)
// - Submodules: miner, thread

pub mod miner;
pub mod thread;

// Re-export key types for convenience
pub use miner::CpuWorkEngine;
