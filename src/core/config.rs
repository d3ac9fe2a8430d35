// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/config.rs
// Version: 1.0.0
//
// This file loads, merges, persists and validates the miner configuration,
// located in the core subdirectory. The config file is a flat JSON object;
// command-line values override it and the result is turned into an
// immutable MiningConfig.
//
// Tree Location:
// - src/core/config.rs (configuration loading and validation)
// - Depends on: serde, serde_json, tracing

use crate::core::error::MinerError;
use crate::core::types::{Args, DEFAULT_POOL_PORT, MiningConfig, NetworkMode, ThreadCount};
use crate::utils::device::resolve_device_name;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_START_DIFFICULTY: f64 = 1.0;

/// On-disk configuration. Every key is optional; `threads` may be a number or "auto".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_difficulty: Option<f64>,
}

impl ConfigFile {
    /// Read the config file. A missing file yields an empty configuration.
    pub fn load(path: &Path) -> Result<Self, MinerError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {:?}", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(MinerError::Config {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&contents).map_err(|e| MinerError::ConfigFormat {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), MinerError> {
        let data = serde_json::to_string_pretty(self).map_err(|e| MinerError::ConfigFormat {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, data).map_err(|e| MinerError::Config {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Overlay the command-line values that are saved back to the file.
    pub fn merge_saved(mut self, args: &Args) -> Self {
        if let Some(address) = &args.address {
            self.address = Some(address.clone());
        }
        if let Some(threads) = &args.threads {
            self.threads = Some(Value::String(threads.clone()));
        }
        if let Some(name) = &args.name {
            self.name = Some(name.clone());
        }
        self
    }

    /// Overlay the command-line values that only apply to this run.
    pub fn apply_overrides(mut self, args: &Args) -> Self {
        if let Some(server) = &args.server {
            self.server = Some(server.clone());
        }
        if args.test {
            self.network = Some(NetworkMode::Test.to_string());
        }
        if let Some(difficulty) = args.start_difficulty {
            self.start_difficulty = Some(difficulty);
        }
        self
    }

    /// Validate and freeze into a MiningConfig.
    pub fn into_mining_config(self) -> Result<MiningConfig, MinerError> {
        let threads = match &self.threads {
            None => ThreadCount::Auto,
            Some(value) => parse_thread_value(value)?,
        };

        let wallet_address = self
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or(MinerError::MissingAddress)?;

        let network = match &self.network {
            None => NetworkMode::Main,
            Some(network) => network.parse()?,
        };

        let start_difficulty = self
            .start_difficulty
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(DEFAULT_START_DIFFICULTY);

        let server = self
            .server
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(MiningConfig {
            wallet_address,
            threads,
            device_name: resolve_device_name(self.name.as_deref().unwrap_or_default()),
            network,
            pool_port: DEFAULT_POOL_PORT,
            start_difficulty,
            server,
        })
    }
}

fn parse_thread_value(value: &Value) -> Result<ThreadCount, MinerError> {
    match value {
        Value::String(s) => s.parse(),
        Value::Number(n) => n
            .as_u64()
            .map(|n| n.to_string())
            .ok_or_else(|| MinerError::InvalidThreadCount(n.to_string()))?
            .parse(),
        other => Err(MinerError::InvalidThreadCount(other.to_string())),
    }
}

/// Load the config file and apply the command line.
///
/// When the address came from the command line, address, threads and name are written
/// back to the file. `--test`, `--server` and `--start-difficulty` never are.
pub fn load_config(args: &Args) -> Result<MiningConfig, MinerError> {
    info!("Reading config from {:?}", args.config);
    let saved = ConfigFile::load(&args.config)?.merge_saved(args);

    // Validate before persisting so a bad value never lands in the file
    let config = saved.clone().apply_overrides(args).into_mining_config()?;

    if args.address.is_some() {
        saved.save(&args.config)?;
        info!("Saved settings to {:?}", args.config);
    }

    Ok(config)
}
