// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/types.rs
// Version: 1.0.0
//
// This file defines core data structures for the miner, located in the core
// subdirectory. It includes the command-line arguments, the immutable mining
// configuration, and the events exchanged between the node, the pool
// connection, the work engine and the controllers.
//
// Tree Location:
// - src/core/types.rs (core data structures)
// - Depends on: clap, serde, num_cpus

use crate::core::error::MinerError;
use crate::miner::stats::DEFAULT_REPORT_WINDOW;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

/// Port shared by every pool server
pub const DEFAULT_POOL_PORT: u16 = 1023;

/// Pool servers probed at startup when no `server` override is configured
pub const DEFAULT_SERVERS: &[&str] = &["hk1a.nimiqpocket.cn"];

pub const DEFAULT_CONFIG_FILE: &str = "config.txt";

/// Command-line arguments for the pocket miner
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pocket-miner",
    version,
    about = "Pool client that connects to the closest pool server and fails over on disconnect",
    long_about = "Pocket Miner ranks the known pool servers by latency, connects to the closest one\n\
                  and moves on to the next server whenever the pool drops the connection.\n\
                  Work only runs while the node reports consensus as established.\n\n\
                  Values given on the command line override the config file. When --address is\n\
                  given, address, threads and name are written back to the config file;\n\
                  --test, --server and --start-difficulty only apply to this run.\n\n\
                  Examples:\n\
                    pocket-miner --address 'NQ07 0000 ...' --threads auto --name rig-01\n\
                    pocket-miner --server hk1a.nimiqpocket.cn --threads 4\n\
                    pocket-miner --test"
)]
pub struct Args {
    /// Wallet address receiving the mining rewards
    #[arg(long, value_name = "ADDRESS", help = "Wallet address for mining rewards")]
    pub address: Option<String>,

    /// Number of worker threads, or "auto" for one per processing unit
    #[arg(
        short,
        long,
        value_name = "COUNT|auto",
        help = "Number of worker threads (positive integer or 'auto')"
    )]
    pub threads: Option<String>,

    /// Device name reported to the pool; "*" picks one from the host
    #[arg(long, value_name = "NAME", help = "Name for this miner ('*' = automatic)")]
    pub name: Option<String>,

    /// Skip latency ranking and always use this pool server
    #[arg(long, value_name = "HOST", help = "Pool server override (skips server ranking)")]
    pub server: Option<String>,

    /// Connect to the test network
    #[arg(long, default_value = "false", help = "Use the test network")]
    pub test: bool,

    #[arg(
        long = "start-difficulty",
        value_name = "DIFFICULTY",
        help = "Initial share difficulty requested from the pool"
    )]
    pub start_difficulty: Option<f64>,

    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_CONFIG_FILE,
        help = "Config file (flat JSON object)"
    )]
    pub config: PathBuf,

    #[arg(
        long,
        value_name = "MILLISECONDS",
        default_value = "3000",
        help = "Per-server timeout for the latency probe"
    )]
    pub probe_timeout_ms: u64,

    #[arg(
        long,
        value_name = "SAMPLES",
        default_value_t = DEFAULT_REPORT_WINDOW,
        help = "Number of hashrate samples averaged into one report"
    )]
    pub report_window: usize,
}

/// Configured worker thread count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadCount {
    #[default]
    Auto,
    Fixed(NonZeroUsize),
}

impl ThreadCount {
    /// Resolve to a concrete count; `Auto` reads the available processing units now.
    pub fn resolve(self) -> usize {
        match self {
            ThreadCount::Auto => num_cpus::get(),
            ThreadCount::Fixed(n) => n.get(),
        }
    }
}

impl FromStr for ThreadCount {
    type Err = MinerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(ThreadCount::Auto);
        }
        trimmed
            .parse::<usize>()
            .ok()
            .and_then(NonZeroUsize::new)
            .map(ThreadCount::Fixed)
            .ok_or_else(|| MinerError::InvalidThreadCount(s.to_string()))
    }
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadCount::Auto => write!(f, "auto"),
            ThreadCount::Fixed(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    #[default]
    Main,
    Test,
}

impl FromStr for NetworkMode {
    type Err = MinerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "main" => Ok(NetworkMode::Main),
            "test" => Ok(NetworkMode::Test),
            other => Err(MinerError::InvalidNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkMode::Main => write!(f, "main"),
            NetworkMode::Test => write!(f, "test"),
        }
    }
}

/// Validated settings, built once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningConfig {
    pub wallet_address: String,
    pub threads: ThreadCount,
    pub device_name: String,
    pub network: NetworkMode,
    pub pool_port: u16,
    pub start_difficulty: f64,
    /// Explicit pool server; replaces latency ranking with a single candidate
    pub server: Option<String>,
}

/// Block produced by the work engine, forwarded for logging only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedBlock {
    pub height: u32,
    pub hash: String,
}

/// Signals from the node: consensus, chain head and peers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    ConsensusEstablished,
    ConsensusLost,
    HeadChanged { height: u32 },
    PeerJoined(String),
    PeerLeft(String),
}

/// Identifies one opened pool connection; every connect or server change gets a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Signals from the pool connection, tagged with the connection they belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolEvent {
    Connected(ConnectionId),
    Disconnected(ConnectionId),
}

/// Signals from the work engine
#[derive(Debug, Clone, PartialEq)]
pub enum WorkEvent {
    HashrateChanged(f64),
    BlockMined(MinedBlock),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_count_accepts_auto_and_positive_integers() {
        assert_eq!("auto".parse::<ThreadCount>().unwrap(), ThreadCount::Auto);
        assert_eq!("AUTO".parse::<ThreadCount>().unwrap(), ThreadCount::Auto);
        assert_eq!(
            " 4 ".parse::<ThreadCount>().unwrap(),
            ThreadCount::Fixed(NonZeroUsize::new(4).unwrap())
        );
    }

    #[test]
    fn thread_count_rejects_zero_negative_and_words() {
        for bad in ["0", "-2", "two", "2.5", ""] {
            let err = bad.parse::<ThreadCount>().unwrap_err();
            assert!(matches!(err, MinerError::InvalidThreadCount(_)), "{bad} should be rejected");
        }
    }

    #[test]
    fn auto_resolves_to_available_units() {
        assert_eq!(ThreadCount::Auto.resolve(), num_cpus::get());
        assert_eq!(ThreadCount::Fixed(NonZeroUsize::new(3).unwrap()).resolve(), 3);
    }

    #[test]
    fn network_mode_parsing() {
        assert_eq!("main".parse::<NetworkMode>().unwrap(), NetworkMode::Main);
        assert_eq!("test".parse::<NetworkMode>().unwrap(), NetworkMode::Test);
        assert!(matches!(
            "dev".parse::<NetworkMode>(),
            Err(MinerError::InvalidNetwork(_))
        ));
        assert_eq!(NetworkMode::Test.to_string(), "test");
    }

    #[test]
    fn args_parse_overrides() {
        let args = Args::parse_from([
            "pocket-miner",
            "--address",
            "NQ07 TEST",
            "--threads",
            "auto",
            "--test",
            "--start-difficulty",
            "2.5",
        ]);
        assert_eq!(args.address.as_deref(), Some("NQ07 TEST"));
        assert_eq!(args.threads.as_deref(), Some("auto"));
        assert!(args.test);
        assert_eq!(args.start_difficulty, Some(2.5));
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert_eq!(args.report_window, 5);
    }
}
