// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/error.rs
// Version: 1.0.0
//
// This file defines the error taxonomy of the miner, located in the core
// subdirectory. Fatal conditions (no reachable server, bad configuration)
// and collaborator failures are all expressed as MinerError.
//
// Tree Location:
// - src/core/error.rs (error types)
// - Depends on: thiserror, serde_json

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MinerError {
    #[error("No pool server answered on port {port}")]
    NoReachableServer { port: u16 },

    #[error("Specify a valid thread number: {0:?} is neither a positive integer nor \"auto\"")]
    InvalidThreadCount(String),

    #[error("No wallet address configured (use --address or the config file)")]
    MissingAddress,

    #[error("Invalid network {0:?}, expected \"main\" or \"test\"")]
    InvalidNetwork(String),

    #[error("Pool server candidate list is empty")]
    EmptyCandidateList,

    #[error("Config file {path:?} could not be accessed")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file {path:?} is malformed")]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Pool call to {host}:{port} failed")]
    Pool {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Lookup failed: {0}")]
    Lookup(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = MinerError::InvalidThreadCount("zero".to_string());
        assert!(err.to_string().contains("\"zero\""));
        let err = MinerError::NoReachableServer { port: 1023 };
        assert_eq!(err.to_string(), "No pool server answered on port 1023");
    }
}
