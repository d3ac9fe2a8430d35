// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/pool/client.rs
// Version: 1.0.0
//
// This file implements the TCP side of pool communication, located in the
// pool subdirectory. TcpProbe times connection establishment for the
// latency prober; TcpPoolConnection holds the live pool connection and
// reports Connected/Disconnected events as the socket opens and closes.
//
// Tree Location:
// - src/pool/client.rs (pool TCP client logic)
// - Depends on: tokio, async-trait, tracing

use crate::core::{ConnectionId, MinerError, PoolEvent};
use crate::pool::failover::PoolConnection;
use crate::pool::finder::Probe;
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpStream, lookup_host};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info};

/// Resolve `host:port`, accepting either an IP address or a domain name
async fn resolve_pool_address(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    lookup_host((host, port)).await?.next().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("No addresses found for {}", host),
        )
    })
}

/// Upper bound on connection establishment to a pool server
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

async fn open_stream(host: &str, port: u16, limit: Duration) -> std::io::Result<TcpStream> {
    let connect = async {
        let addr = resolve_pool_address(host, port).await?;
        TcpStream::connect(addr).await
    };
    let stream = time::timeout(limit, connect).await.map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("No answer from {}:{} within {:?}", host, port, limit),
        )
    })??;
    stream.set_nodelay(true)?; // Disable Nagle's algorithm for low latency
    Ok(stream)
}

/// Latency probe timing TCP connection establishment (name resolution excluded)
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, host: &str, port: u16) -> std::io::Result<Duration> {
        let addr = resolve_pool_address(host, port).await?;
        let started = Instant::now();
        let _stream = TcpStream::connect(addr).await?;
        Ok(started.elapsed())
    }
}

/// Live pool connection over TCP.
///
/// Each successful connect gets a fresh `ConnectionId` and spawns a reader task that
/// emits `PoolEvent::Connected` once and `PoolEvent::Disconnected` when the server
/// closes the socket or a read fails, both tagged with that id. Switching servers
/// aborts the previous reader without a disconnect event.
pub struct TcpPoolConnection {
    events: UnboundedSender<PoolEvent>,
    reader: Mutex<Option<JoinHandle<()>>>,
    opened: AtomicU64,
    connect_timeout: Duration,
}

impl TcpPoolConnection {
    pub fn new(events: UnboundedSender<PoolEvent>) -> Self {
        Self {
            events,
            reader: Mutex::new(None),
            opened: AtomicU64::new(0),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, limit: Duration) -> Self {
        self.connect_timeout = limit;
        self
    }

    fn abort_reader(&self) {
        let previous = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = previous {
            handle.abort();
        }
    }

    async fn open(&self, host: &str, port: u16) -> Result<ConnectionId, MinerError> {
        let stream = open_stream(host, port, self.connect_timeout)
            .await
            .map_err(|e| MinerError::Pool {
                host: host.to_string(),
                port,
                source: e,
            })?;
        let id = ConnectionId(self.opened.fetch_add(1, Ordering::Relaxed) + 1);
        info!("TCP connection {} to {}:{} established", id, host, port);

        let events = self.events.clone();
        let peer = format!("{}:{}", host, port);
        let handle = tokio::spawn(async move {
            let _ = events.send(PoolEvent::Connected(id));
            let mut lines = BufReader::new(stream).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => debug!("📨 {}: {}", peer, line),
                    Ok(None) => {
                        info!("📡 Connection to {} closed by server", peer);
                        break;
                    }
                    Err(e) => {
                        info!("📡 Error reading from {}: {}", peer, e);
                        break;
                    }
                }
            }
            let _ = events.send(PoolEvent::Disconnected(id));
        });

        *self.reader.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(id)
    }
}

#[async_trait]
impl PoolConnection for TcpPoolConnection {
    async fn connect(&self, host: &str, port: u16) -> Result<ConnectionId, MinerError> {
        self.abort_reader();
        self.open(host, port).await
    }

    async fn change_server(&self, host: &str, port: u16) -> Result<ConnectionId, MinerError> {
        self.abort_reader();
        self.open(host, port).await
    }
}

impl Drop for TcpPoolConnection {
    fn drop(&mut self) {
        self.abort_reader();
    }
}
