// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/node/standalone.rs
// Version: 1.0.0
//
// This file implements the node adapter used by the binary when no
// consensus library is linked in. It reports consensus as established once
// started, tracks the chain head it is told about, and answers balance and
// mempool lookups as unavailable.
//
// Tree Location:
// - src/node/standalone.rs (standalone node adapter)
// - Depends on: tokio, async-trait, hex

use super::{AccountSnapshot, AccountStore, ChainInfo, Mempool};
use crate::core::{MinerError, NodeEvent};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

pub struct StandaloneNode {
    height: AtomicU32,
    head_hash: Mutex<[u8; 32]>,
    events: Mutex<Option<UnboundedSender<NodeEvent>>>,
}

impl StandaloneNode {
    pub fn new() -> Self {
        Self {
            height: AtomicU32::new(0),
            head_hash: Mutex::new([0u8; 32]),
            events: Mutex::new(None),
        }
    }

    /// Begin publishing events; consensus is established immediately.
    pub fn start(&self, events: UnboundedSender<NodeEvent>) {
        info!("Standalone node: no chain sync, consensus established at start");
        let _ = events.send(NodeEvent::ConsensusEstablished);
        *self.events.lock().unwrap_or_else(PoisonError::into_inner) = Some(events);
    }

    /// Record a new chain head and publish it
    pub fn set_head(&self, height: u32, hash: [u8; 32]) {
        self.height.store(height, Ordering::Relaxed);
        *self.head_hash.lock().unwrap_or_else(PoisonError::into_inner) = hash;
        if let Some(events) = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            let _ = events.send(NodeEvent::HeadChanged { height });
        }
    }
}

impl Default for StandaloneNode {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainInfo for StandaloneNode {
    fn height(&self) -> u32 {
        self.height.load(Ordering::Relaxed)
    }

    fn head_hash(&self) -> String {
        hex::encode(*self.head_hash.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl AccountStore for StandaloneNode {
    async fn get(&self, address: &str) -> Result<AccountSnapshot, MinerError> {
        Err(MinerError::Lookup(format!(
            "no account state for {} without a synced node",
            address
        )))
    }
}

#[async_trait]
impl Mempool for StandaloneNode {
    async fn transaction_count(&self) -> Result<usize, MinerError> {
        Err(MinerError::Lookup("no mempool without a synced node".to_string()))
    }
}
