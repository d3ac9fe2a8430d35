// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/stats/mod.rs
// Version: 1.0.0
//
// This file is the module declaration for the statistics functionality of
// the miner, located in the stats subdirectory of the miner module.
//
// Tree Location:
// - src/miner/stats/mod.rs (stats module entry point)
// - Submodules: aggregator

pub mod aggregator;

// Re-export key types for convenience
pub use aggregator::{DEFAULT_REPORT_WINDOW, HashrateReport, ReportEmitter, ThroughputAggregator};
