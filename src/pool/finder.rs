// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/pool/finder.rs
// Version: 1.0.0
//
// This file ranks pool servers by reachability latency, located in the pool
// subdirectory. All servers are probed concurrently with a per-server
// timeout; unreachable servers are dropped and the rest are sorted by
// latency. The resulting CandidateList fixes the failover order for the
// lifetime of the process.
//
// Tree Location:
// - src/pool/finder.rs (latency prober and candidate list)
// - Depends on: tokio, futures, async-trait, tracing

use crate::core::MinerError;
use async_trait::async_trait;
use futures::future::join_all;
use std::ops::Index;
use std::time::Duration;
use tokio::time;
use tracing::{debug, info};

/// Measures how long it takes to reach `host:port`
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, host: &str, port: u16) -> std::io::Result<Duration>;
}

/// Pool server eligible for connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCandidate {
    pub host: String,
    /// Measured probe latency; `None` when the server was configured rather than probed
    pub latency: Option<Duration>,
}

impl ServerCandidate {
    pub fn new(host: impl Into<String>, latency: Option<Duration>) -> Self {
        Self {
            host: host.into(),
            latency,
        }
    }
}

/// Ordered, non-empty failover sequence. Never re-sorted after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateList(Vec<ServerCandidate>);

impl CandidateList {
    pub fn new(candidates: Vec<ServerCandidate>) -> Result<Self, MinerError> {
        if candidates.is_empty() {
            return Err(MinerError::EmptyCandidateList);
        }
        Ok(Self(candidates))
    }

    /// Single-server list for an explicit server override
    pub fn pinned(host: impl Into<String>) -> Self {
        Self(vec![ServerCandidate::new(host, None)])
    }

    /// Build the list: the override if one is configured, otherwise rank `hosts`.
    pub async fn discover<P: Probe>(
        server: Option<&str>,
        hosts: &[String],
        port: u16,
        finder: &ServerFinder<P>,
    ) -> Result<Self, MinerError> {
        match server {
            Some(host) => {
                info!("Using configured pool server {}, skipping server ranking", host);
                Ok(Self::pinned(host))
            }
            None => Self::new(finder.rank(hosts, port).await?),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServerCandidate> {
        self.0.iter()
    }
}

impl Index<usize> for CandidateList {
    type Output = ServerCandidate;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Latency prober
pub struct ServerFinder<P> {
    probe: P,
    timeout: Duration,
}

impl<P: Probe> ServerFinder<P> {
    pub fn new(probe: P, timeout: Duration) -> Self {
        Self { probe, timeout }
    }

    /// Probe every host concurrently and return the reachable ones, fastest first.
    ///
    /// Ties keep input order. Duplicate hosts are probed once. Fails with
    /// `NoReachableServer` when nothing answers within the timeout.
    pub async fn rank(
        &self,
        hosts: &[String],
        port: u16,
    ) -> Result<Vec<ServerCandidate>, MinerError> {
        let mut unique: Vec<&str> = Vec::with_capacity(hosts.len());
        for host in hosts {
            if !unique.contains(&host.as_str()) {
                unique.push(host);
            }
        }

        info!("Finding closest server among {} candidates", unique.len());
        let probes = unique.into_iter().map(|host| async move {
            match time::timeout(self.timeout, self.probe.probe(host, port)).await {
                Ok(Ok(latency)) => {
                    debug!("{}:{} answered in {:?}", host, port, latency);
                    Some(ServerCandidate::new(host, Some(latency)))
                }
                Ok(Err(e)) => {
                    debug!("{}:{} unreachable: {}", host, port, e);
                    None
                }
                Err(_) => {
                    debug!("{}:{} timed out after {:?}", host, port, self.timeout);
                    None
                }
            }
        });

        let mut ranked: Vec<ServerCandidate> = join_all(probes).await.into_iter().flatten().collect();
        if ranked.is_empty() {
            return Err(MinerError::NoReachableServer { port });
        }

        // sort_by_key is stable, equal latencies keep probe order
        ranked.sort_by_key(|c| c.latency);
        info!("Closest server: {}", ranked[0].host);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers after a fixed delay, or refuses
    struct ScriptedProbe {
        delays: HashMap<String, Option<Duration>>,
        probed: Mutex<Vec<String>>,
    }

    impl ScriptedProbe {
        fn new(entries: &[(&str, Option<u64>)]) -> Self {
            Self {
                delays: entries
                    .iter()
                    .map(|(host, ms)| (host.to_string(), ms.map(Duration::from_millis)))
                    .collect(),
                probed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        async fn probe(&self, host: &str, _port: u16) -> std::io::Result<Duration> {
            self.probed.lock().unwrap().push(host.to_string());
            match self.delays.get(host).copied().flatten() {
                Some(delay) => {
                    time::sleep(delay).await;
                    Ok(delay)
                }
                None => Err(std::io::ErrorKind::ConnectionRefused.into()),
            }
        }
    }

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|h| h.to_string()).collect()
    }

    #[tokio::test]
    async fn ranks_reachable_hosts_by_latency() {
        let probe = ScriptedProbe::new(&[("a", Some(60)), ("b", None), ("c", Some(10)), ("d", Some(30))]);
        let finder = ServerFinder::new(probe, Duration::from_secs(2));

        let ranked = finder.rank(&hosts(&["a", "b", "c", "d"]), 1023).await.unwrap();
        let order: Vec<&str> = ranked.iter().map(|c| c.host.as_str()).collect();
        assert_eq!(order, vec!["c", "d", "a"]);
        assert!(ranked.windows(2).all(|w| w[0].latency <= w[1].latency));
    }

    #[tokio::test]
    async fn equal_latencies_keep_input_order() {
        let probe = ScriptedProbe::new(&[("x", Some(20)), ("y", Some(5)), ("z", Some(20))]);
        let finder = ServerFinder::new(probe, Duration::from_secs(2));

        let ranked = finder.rank(&hosts(&["z", "x", "y"]), 1023).await.unwrap();
        let order: Vec<&str> = ranked.iter().map(|c| c.host.as_str()).collect();
        assert_eq!(order, vec!["y", "z", "x"]);
    }

    #[tokio::test]
    async fn slow_hosts_are_excluded() {
        let probe = ScriptedProbe::new(&[("fast", Some(5)), ("slow", Some(5_000))]);
        let finder = ServerFinder::new(probe, Duration::from_millis(200));

        let started = std::time::Instant::now();
        let ranked = finder.rank(&hosts(&["slow", "fast"]), 1023).await.unwrap();
        assert_eq!(ranked, vec![ServerCandidate::new("fast", Some(Duration::from_millis(5)))]);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn probes_run_concurrently() {
        let probe = ScriptedProbe::new(&[("a", Some(300)), ("b", Some(300)), ("c", Some(300))]);
        let finder = ServerFinder::new(probe, Duration::from_secs(2));

        let started = std::time::Instant::now();
        finder.rank(&hosts(&["a", "b", "c"]), 1023).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(800));
    }

    #[tokio::test]
    async fn nothing_reachable_is_an_error() {
        let probe = ScriptedProbe::new(&[("a", None), ("b", None)]);
        let finder = ServerFinder::new(probe, Duration::from_millis(100));

        let err = finder.rank(&hosts(&["a", "b"]), 1023).await.unwrap_err();
        assert!(matches!(err, MinerError::NoReachableServer { port: 1023 }));
    }

    #[tokio::test]
    async fn duplicate_hosts_are_probed_once() {
        let probe = ScriptedProbe::new(&[("a", Some(1))]);
        let finder = ServerFinder::new(probe, Duration::from_secs(1));

        let ranked = finder.rank(&hosts(&["a", "a"]), 1023).await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(finder.probe.probed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn server_override_skips_probing() {
        let probe = ScriptedProbe::new(&[("a", Some(1))]);
        let finder = ServerFinder::new(probe, Duration::from_secs(1));

        let list = CandidateList::discover(Some("pinned.example"), &hosts(&["a"]), 1023, &finder)
            .await
            .unwrap();
        assert_eq!(list, CandidateList::pinned("pinned.example"));
        assert!(finder.probe.probed.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_candidate_list_is_rejected() {
        assert!(matches!(CandidateList::new(Vec::new()), Err(MinerError::EmptyCandidateList)));
    }
}
