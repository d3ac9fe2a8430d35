// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/session.rs
// Version: 1.0.0
//
// This file wires the event sources to the controllers, located in the miner
// subdirectory. One loop receives node, pool and work events and runs each
// handler to completion before taking the next event, so every source is
// processed in arrival order and the failover controller never has two
// server switches in flight. Scheduled server switches are one more branch
// of the loop, so a pool outage never holds back consensus or work events.
// Report emission runs as its own task.
//
// Tree Location:
// - src/miner/session.rs (event loop)
// - Depends on: tokio, tokio-util, tracing

use crate::core::{NodeEvent, PoolEvent, WorkEvent};
use crate::miner::lifecycle::{WorkController, WorkEngine};
use crate::miner::stats::{ReportEmitter, ThroughputAggregator};
use crate::node::ChainInfo;
use crate::pool::failover::{FailoverController, PoolConnection};
use crate::utils::FormatUtils;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{self, Instant as Deadline};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Heights logged while consensus is not established
const HEAD_LOG_INTERVAL: u32 = 100;

/// Incoming event channels, one per source
pub struct EventSources {
    pub node: UnboundedReceiver<NodeEvent>,
    pub pool: UnboundedReceiver<PoolEvent>,
    pub work: UnboundedReceiver<WorkEvent>,
}

pub struct Session<C, W> {
    failover: FailoverController<C>,
    work: WorkController<W>,
    aggregator: ThroughputAggregator,
    chain: Arc<dyn ChainInfo>,
    shutdown: CancellationToken,
    started: Instant,
    consensus: bool,
}

impl<C, W> Session<C, W>
where
    C: PoolConnection,
    W: WorkEngine,
{
    pub fn new(
        failover: FailoverController<C>,
        work: WorkController<W>,
        aggregator: ThroughputAggregator,
        chain: Arc<dyn ChainInfo>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            failover,
            work,
            aggregator,
            chain,
            shutdown,
            started: Instant::now(),
            consensus: false,
        }
    }

    /// Measure the consensus time from `started` instead of session creation
    pub fn started_at(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }

    pub fn failover(&self) -> &FailoverController<C> {
        &self.failover
    }

    pub fn work(&self) -> &WorkController<W> {
        &self.work
    }

    /// Process events until shutdown or until every source has closed.
    ///
    /// Work is stopped on the way out. Returns the session so callers can inspect
    /// the final controller state.
    pub async fn run(
        mut self,
        mut sources: EventSources,
        emitter: ReportEmitter,
        means: UnboundedReceiver<f64>,
    ) -> Self {
        let reporter = tokio::spawn(emitter.run(means, self.shutdown.clone()));

        let (mut node_open, mut pool_open, mut work_open) = (true, true, true);
        while node_open || pool_open || work_open {
            let switch_at = self.failover.switch_deadline();
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                event = sources.node.recv(), if node_open => match event {
                    Some(event) => self.handle_node_event(event).await,
                    None => node_open = false,
                },
                event = sources.pool.recv(), if pool_open => match event {
                    Some(event) => self.handle_pool_event(event),
                    None => pool_open = false,
                },
                event = sources.work.recv(), if work_open => match event {
                    Some(event) => self.handle_work_event(event),
                    None => work_open = false,
                },
                _ = time::sleep_until(switch_at.unwrap_or_else(Deadline::now)), if switch_at.is_some() => {
                    self.failover.switch_server().await
                }
            }
        }
        if !(node_open || pool_open || work_open) {
            debug!("All event sources closed");
        }

        self.work.on_lost();
        self.shutdown.cancel();
        if let Err(e) = reporter.await {
            warn!("Report emitter ended abnormally: {}", e);
        }
        self
    }

    async fn handle_node_event(&mut self, event: NodeEvent) {
        match event {
            NodeEvent::ConsensusEstablished => {
                self.consensus = true;
                info!(
                    "🔗 Consensus established in {}",
                    FormatUtils::format_elapsed(self.started.elapsed())
                );
                info!(
                    "Current state: height={}, headHash={}",
                    self.chain.height(),
                    self.chain.head_hash()
                );
                self.work.on_ready();
                self.failover.on_established().await;
            }
            NodeEvent::ConsensusLost => {
                self.consensus = false;
                info!("Consensus lost");
                self.work.on_lost();
            }
            NodeEvent::HeadChanged { height } => {
                if self.consensus || height % HEAD_LOG_INTERVAL == 0 {
                    info!("Now at block: {}", height);
                }
            }
            NodeEvent::PeerJoined(peer) => info!("Connected to {}", peer),
            NodeEvent::PeerLeft(peer) => info!("Disconnected from {}", peer),
        }
    }

    fn handle_pool_event(&mut self, event: PoolEvent) {
        match event {
            PoolEvent::Connected(id) => self.failover.on_connected(id),
            PoolEvent::Disconnected(id) => self.failover.on_disconnected(id),
        }
    }

    fn handle_work_event(&mut self, event: WorkEvent) {
        match event {
            WorkEvent::HashrateChanged(rate) => self.aggregator.observe(rate),
            WorkEvent::BlockMined(block) => self.work.on_block_mined(block),
        }
    }
}
