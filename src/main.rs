// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/main.rs
// Version: 1.0.0
//
// This file is the entry point of the miner. It loads the configuration,
// ranks the pool servers, wires the pool connection, node and work engine
// into a session and runs it until Ctrl+C.
//
// Tree Location:
// - src/main.rs (binary entry point)
// - Depends on: clap, tokio, tokio-util, tracing-subscriber

use clap::Parser;
use pocket_miner::{
    Result,
    core::{Args, DEFAULT_SERVERS, MiningConfig, NetworkMode, load_config},
    miner::{CpuWorkEngine, EventSources, ReportEmitter, Session, ThroughputAggregator, WorkController},
    node::{ChainInfo, StandaloneNode},
    pool::{Backoff, CandidateList, FailoverController, ServerFinder, TcpPoolConnection, TcpProbe},
    utils::user_agent::user_agent,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() {
    let started = Instant::now();
    init_tracing();
    let args = Args::parse();

    if let Err(err) = run(args, started).await {
        error!("❌ {}", err);
        let mut source = std::error::Error::source(&*err);
        while let Some(cause) = source {
            error!("   caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

async fn run(args: Args, started: Instant) -> Result<()> {
    let config = load_config(&args)?;
    if config.network == NetworkMode::Test {
        warn!("----- YOU ARE CONNECTING TO TESTNET -----");
    }

    let hosts: Vec<String> = DEFAULT_SERVERS.iter().map(|h| h.to_string()).collect();
    let finder = ServerFinder::new(TcpProbe, Duration::from_millis(args.probe_timeout_ms));
    let candidates =
        CandidateList::discover(config.server.as_deref(), &hosts, config.pool_port, &finder).await?;

    print_banner(&config, &candidates);

    let shutdown = CancellationToken::new();
    let (node_tx, node_rx) = mpsc::unbounded_channel();
    let (pool_tx, pool_rx) = mpsc::unbounded_channel();
    let (work_tx, work_rx) = mpsc::unbounded_channel();

    let node = Arc::new(StandaloneNode::new());
    let failover = FailoverController::new(TcpPoolConnection::new(pool_tx), candidates, config.pool_port)
        .with_backoff(Backoff::default());
    let work = WorkController::new(CpuWorkEngine::new(work_tx), config.threads);
    let (aggregator, means) = ThroughputAggregator::new(args.report_window);
    let emitter = ReportEmitter::new(node.clone(), node.clone(), config.wallet_address.clone());
    let chain: Arc<dyn ChainInfo> = node.clone();

    let session = Session::new(failover, work, aggregator, chain, shutdown.clone()).started_at(started);

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down");
        }
        ctrl_c.cancel();
    });

    info!("Waiting for consensus");
    node.start(node_tx);

    let sources = EventSources {
        node: node_rx,
        pool: pool_rx,
        work: work_rx,
    };
    let session = session.run(sources, emitter, means).await;
    info!(
        "Stopped; last pool server {}",
        session.failover().current().host
    );
    Ok(())
}

fn print_banner(config: &MiningConfig, candidates: &CandidateList) {
    info!("🚀 {} starting", user_agent());
    info!("- network        = {}", config.network);
    info!("- threads        = {}", config.threads);
    info!("- wallet address = {}", config.wallet_address);
    info!("- device name    = {}", config.device_name);
    info!("- start diff     = {}", config.start_difficulty);
    for (rank, candidate) in candidates.iter().enumerate() {
        match candidate.latency {
            Some(latency) => info!(
                "- server #{}      = {}:{} ({} ms)",
                rank + 1,
                candidate.host,
                config.pool_port,
                latency.as_millis()
            ),
            None => info!("- server #{}      = {}:{}", rank + 1, candidate.host, config.pool_port),
        }
    }
}
