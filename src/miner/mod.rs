// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/mod.rs
// Version: 1.0.0
//
// This file is the module declaration for the miner functionality, located
// in the miner subdirectory. It declares submodules and re-exports key types
// for use throughout the project.
//
// Tree Location:
// - src/miner/mod.rs (miner module entry point)
// - Submodules: cpu, lifecycle, session, stats

pub mod cpu;
pub mod lifecycle;
pub mod session;
pub mod stats;

// Re-export key types for convenience
pub use cpu::CpuWorkEngine;
pub use lifecycle::{WorkController, WorkEngine};
pub use session::{EventSources, Session};
pub use stats::{HashrateReport, ReportEmitter, ThroughputAggregator};
