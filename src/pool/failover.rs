// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/pool/failover.rs
// Version: 1.0.0
//
// This file implements the failover connection controller, located in the
// pool subdirectory. It owns the ranked candidate list and a cursor into it,
// and is the only place that decides which pool server is active.
//
// States: Idle -> Connecting -> Connected. A disconnect of the current
// connection advances the cursor (wrapping to the first candidate) and
// schedules one server switch after the backoff delay. The controller never
// waits itself: the session fires the switch when its deadline passes, so
// other events keep flowing while the pool is down. A switch the pool
// refuses counts as another disconnect. Candidates are never removed and
// retries never stop.
//
// Tree Location:
// - src/pool/failover.rs (failover state machine, backoff)
// - Depends on: tokio, async-trait, tracing

use crate::core::{ConnectionId, MinerError};
use crate::pool::finder::{CandidateList, ServerCandidate};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Handle to the external pool connection.
///
/// Both calls return the id that tags the events of the connection they open.
#[async_trait]
pub trait PoolConnection: Send + Sync {
    async fn connect(&self, host: &str, port: u16) -> Result<ConnectionId, MinerError>;
    async fn change_server(&self, host: &str, port: u16) -> Result<ConnectionId, MinerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
}

/// Bounded exponential delay between a disconnect and the next server switch.
///
/// Delays run `base, 2*base, 4*base, ...` capped at `max`, and start over once a
/// connection is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    /// Switch servers immediately
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn next_delay(&mut self) -> Duration {
        if self.base.is_zero() {
            return Duration::ZERO;
        }
        let factor = 1u32 << self.attempt.min(16);
        self.attempt = self.attempt.saturating_add(1);
        self.base.saturating_mul(factor).min(self.max)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60))
    }
}

pub struct FailoverController<C> {
    pool: C,
    candidates: CandidateList,
    cursor: usize,
    port: u16,
    state: ConnectionState,
    backoff: Backoff,
    // Connection whose events are current; anything else is stale
    connection: Option<ConnectionId>,
    switch_at: Option<Instant>,
}

impl<C: PoolConnection> FailoverController<C> {
    pub fn new(pool: C, candidates: CandidateList, port: u16) -> Self {
        Self {
            pool,
            candidates,
            cursor: 0,
            port,
            state: ConnectionState::Idle,
            backoff: Backoff::default(),
            connection: None,
            switch_at: None,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    pub fn current(&self) -> &ServerCandidate {
        // The list is non-empty and the cursor always stays below its length
        &self.candidates[self.cursor]
    }

    pub fn pool(&self) -> &C {
        &self.pool
    }

    /// Id of the connection currently tracked, if a call has succeeded
    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    /// When the scheduled server switch is due; `None` if none is scheduled
    pub fn switch_deadline(&self) -> Option<Instant> {
        self.switch_at
    }

    /// Initial connection to the candidate under the cursor. No-op unless Idle.
    pub async fn connect(&mut self) {
        if self.state != ConnectionState::Idle {
            debug!("Pool connect skipped, already {:?}", self.state);
            return;
        }
        self.state = ConnectionState::Connecting;

        let host = self.current().host.clone();
        info!("Connecting to pool {}:{}", host, self.port);
        match self.pool.connect(&host, self.port).await {
            Ok(id) => self.connection = Some(id),
            Err(e) => {
                warn!("Could not connect to {}:{}: {}", host, self.port, e);
                self.schedule_switch();
            }
        }
    }

    /// Consensus established: start connecting if not already connected or connecting.
    pub async fn on_established(&mut self) {
        if self.state == ConnectionState::Idle {
            self.connect().await;
        }
    }

    /// The pool confirmed connection `id`.
    pub fn on_connected(&mut self, id: ConnectionId) {
        if self.connection != Some(id) {
            debug!("Ignoring connected signal of stale connection {}", id);
            return;
        }
        if self.state != ConnectionState::Connecting {
            debug!("Ignoring pool connected signal while {:?}", self.state);
            return;
        }
        self.state = ConnectionState::Connected;
        self.backoff.reset();
        info!("Connected to pool {}:{}", self.current().host, self.port);
    }

    /// The pool dropped connection `id`: move on to the next candidate.
    pub fn on_disconnected(&mut self, id: ConnectionId) {
        if self.state == ConnectionState::Idle {
            debug!("Ignoring pool disconnect while idle");
            return;
        }
        if self.connection != Some(id) {
            debug!("Ignoring disconnect of stale connection {}", id);
            return;
        }
        self.connection = None;
        self.schedule_switch();
    }

    /// Issue the scheduled `change_server` call. No-op when nothing is scheduled.
    ///
    /// The caller waits for `switch_deadline` first.
    pub async fn switch_server(&mut self) {
        if self.switch_at.take().is_none() {
            return;
        }
        tokio::task::yield_now().await;

        let host = self.current().host.clone();
        match self.pool.change_server(&host, self.port).await {
            Ok(id) => self.connection = Some(id),
            Err(e) => {
                warn!("Could not switch to {}:{}: {}", host, self.port, e);
                self.schedule_switch();
            }
        }
    }

    // One disconnect, one scheduled switch
    fn schedule_switch(&mut self) {
        let lost = self.current().host.clone();
        self.cursor = (self.cursor + 1) % self.candidates.len();
        self.state = ConnectionState::Connecting;

        let delay = self.backoff.next_delay();
        self.switch_at = Some(Instant::now() + delay);
        warn!(
            "Lost pool connection {}, switching to {} in {:?}",
            lost,
            self.current().host,
            delay
        );
    }
}
