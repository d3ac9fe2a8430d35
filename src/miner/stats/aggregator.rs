// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/stats/aggregator.rs
// Version: 1.0.0
//
// This file implements hashrate reporting, located in the stats subdirectory
// of the miner module. ThroughputAggregator buffers hashrate samples and
// hands the mean of every full window to ReportEmitter, which looks up the
// wallet balance and mempool size at that moment and logs one report line.
//
// Tree Location:
// - src/miner/stats/aggregator.rs (windowed hashrate reports)
// - Depends on: tokio, tokio-util, tracing, format utils

use crate::node::{AccountStore, Mempool};
use crate::utils::FormatUtils;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Samples averaged into one report
pub const DEFAULT_REPORT_WINDOW: usize = 5;

pub struct ThroughputAggregator {
    window: usize,
    samples: Mutex<Vec<f64>>,
    ready: UnboundedSender<f64>,
}

impl ThroughputAggregator {
    /// Returns the aggregator and the receiver of window means.
    pub fn new(window: usize) -> (Self, UnboundedReceiver<f64>) {
        let window = window.max(1);
        let (ready, means) = mpsc::unbounded_channel();
        let aggregator = Self {
            window,
            samples: Mutex::new(Vec::with_capacity(window)),
            ready,
        };
        (aggregator, means)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Samples waiting for the window to fill
    pub fn pending(&self) -> usize {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Buffer one sample. Never waits on report emission.
    pub fn observe(&self, sample: f64) {
        let mean = {
            let mut samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
            samples.push(sample);
            if samples.len() < self.window {
                return;
            }
            let mean = samples.iter().sum::<f64>() / samples.len() as f64;
            samples.clear();
            mean
        };

        if self.ready.send(mean).is_err() {
            debug!("Report emitter gone, dropping window mean {}", mean);
        }
    }
}

/// One emitted report
#[derive(Debug, Clone, PartialEq)]
pub struct HashrateReport {
    pub mean: f64,
    pub hashrate: String,
    /// Balance in the smallest unit; `None` if the lookup failed
    pub balance: Option<u64>,
    pub pending_transactions: Option<usize>,
}

impl fmt::Display for HashrateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hashrate: {} - Balance: ", self.hashrate)?;
        match self.balance {
            Some(balance) => write!(f, "{} NIM", FormatUtils::format_coins(balance))?,
            None => write!(f, "n/a")?,
        }
        match self.pending_transactions {
            Some(count) => write!(f, " - Mempool: {} tx", count),
            None => write!(f, " - Mempool: n/a"),
        }
    }
}

/// Turns window means into reports with fresh balance and mempool lookups
pub struct ReportEmitter {
    accounts: Arc<dyn AccountStore>,
    mempool: Arc<dyn Mempool>,
    address: String,
    sink: Option<UnboundedSender<HashrateReport>>,
}

impl ReportEmitter {
    pub fn new(accounts: Arc<dyn AccountStore>, mempool: Arc<dyn Mempool>, address: String) -> Self {
        Self {
            accounts,
            mempool,
            address,
            sink: None,
        }
    }

    /// Also forward every report to `sink`
    pub fn with_sink(mut self, sink: UnboundedSender<HashrateReport>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub async fn build(&self, mean: f64) -> HashrateReport {
        let (account, pending) = tokio::join!(
            self.accounts.get(&self.address),
            self.mempool.transaction_count()
        );

        let balance = account
            .map(|a| a.balance)
            .map_err(|e| warn!("Balance lookup failed: {}", e))
            .ok();
        let pending_transactions = pending
            .map_err(|e| warn!("Mempool lookup failed: {}", e))
            .ok();

        HashrateReport {
            mean,
            hashrate: FormatUtils::format_hashrate(mean),
            balance,
            pending_transactions,
        }
    }

    /// Emit a report for every window mean until the channel closes or shutdown.
    pub async fn run(self, mut means: UnboundedReceiver<f64>, shutdown: CancellationToken) {
        loop {
            let mean = tokio::select! {
                mean = means.recv() => match mean {
                    Some(mean) => mean,
                    None => break,
                },
                _ = shutdown.cancelled() => break,
            };

            let report = self.build(mean).await;
            info!("📊 {}", report);
            if let Some(sink) = &self.sink {
                let _ = sink.send(report);
            }
        }
        debug!("Report emitter stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MinerError;
    use crate::node::AccountSnapshot;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    /// Balance that changes between lookups, to show reports are not cached
    struct Ledger {
        balance: AtomicU64,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl AccountStore for Ledger {
        async fn get(&self, _address: &str) -> Result<AccountSnapshot, MinerError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(AccountSnapshot {
                balance: self.balance.load(Ordering::SeqCst),
            })
        }
    }

    #[async_trait]
    impl Mempool for Ledger {
        async fn transaction_count(&self) -> Result<usize, MinerError> {
            Ok(3)
        }
    }

    struct Offline;

    #[async_trait]
    impl AccountStore for Offline {
        async fn get(&self, _address: &str) -> Result<AccountSnapshot, MinerError> {
            Err(MinerError::Lookup("offline".to_string()))
        }
    }

    #[async_trait]
    impl Mempool for Offline {
        async fn transaction_count(&self) -> Result<usize, MinerError> {
            Err(MinerError::Lookup("offline".to_string()))
        }
    }

    fn ledger(balance: u64) -> Arc<Ledger> {
        Arc::new(Ledger {
            balance: AtomicU64::new(balance),
            lookups: AtomicUsize::new(0),
        })
    }

    #[test]
    fn full_window_yields_mean() {
        let (aggregator, mut means) = ThroughputAggregator::new(5);
        for sample in [10.0, 20.0, 30.0, 40.0] {
            aggregator.observe(sample);
        }
        assert!(means.try_recv().is_err());
        assert_eq!(aggregator.pending(), 4);

        aggregator.observe(50.0);
        assert_eq!(means.try_recv().unwrap(), 30.0);
        assert!(means.try_recv().is_err());
        assert_eq!(aggregator.pending(), 0);
    }

    #[test]
    fn partial_window_emits_nothing() {
        let (aggregator, mut means) = ThroughputAggregator::new(5);
        aggregator.observe(1_500_000.0);
        assert!(means.try_recv().is_err());

        for _ in 0..4 {
            aggregator.observe(1_500_000.0);
        }
        let mean = means.try_recv().unwrap();
        assert_eq!(FormatUtils::format_hashrate(mean), "1.5 MH/s");
    }

    #[test]
    fn windows_do_not_overlap() {
        let (aggregator, mut means) = ThroughputAggregator::new(2);
        for sample in [1.0, 3.0, 10.0, 20.0, 7.0] {
            aggregator.observe(sample);
        }
        assert_eq!(means.try_recv().unwrap(), 2.0);
        assert_eq!(means.try_recv().unwrap(), 15.0);
        assert!(means.try_recv().is_err());
        assert_eq!(aggregator.pending(), 1);
    }

    #[test]
    fn zero_window_is_treated_as_one() {
        let (aggregator, mut means) = ThroughputAggregator::new(0);
        assert_eq!(aggregator.window(), 1);
        aggregator.observe(8.0);
        assert_eq!(means.try_recv().unwrap(), 8.0);
    }

    #[tokio::test]
    async fn report_reads_balance_at_emission_time() {
        let ledger = ledger(150_000);
        let emitter = ReportEmitter::new(ledger.clone(), ledger.clone(), "NQ07".to_string());

        let first = emitter.build(30.0).await;
        ledger.balance.store(250_000, Ordering::SeqCst);
        let second = emitter.build(30.0).await;

        assert_eq!(first.balance, Some(150_000));
        assert_eq!(second.balance, Some(250_000));
        assert_eq!(ledger.lookups.load(Ordering::SeqCst), 2);
        assert_eq!(
            first.to_string(),
            "Hashrate: 30 H/s - Balance: 1.5 NIM - Mempool: 3 tx"
        );
    }

    #[tokio::test]
    async fn failed_lookups_still_report() {
        let offline = Arc::new(Offline);
        let emitter = ReportEmitter::new(offline.clone(), offline, "NQ07".to_string());
        let report = emitter.build(1000.0).await;
        assert_eq!(report.balance, None);
        assert_eq!(report.pending_transactions, None);
        assert_eq!(report.to_string(), "Hashrate: 1.0 kH/s - Balance: n/a - Mempool: n/a");
    }

    #[tokio::test]
    async fn run_emits_one_report_per_window() {
        let ledger = ledger(0);
        let (aggregator, means) = ThroughputAggregator::new(5);
        let (sink, mut reports) = mpsc::unbounded_channel();
        let emitter =
            ReportEmitter::new(ledger.clone(), ledger, "NQ07".to_string()).with_sink(sink);
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(emitter.run(means, shutdown.clone()));

        for sample in [10.0, 20.0, 30.0, 40.0, 50.0, 60.0] {
            aggregator.observe(sample);
        }

        let report = reports.recv().await.unwrap();
        assert_eq!(report.mean, 30.0);
        assert_eq!(report.hashrate, "30 H/s");
        assert!(reports.try_recv().is_err());

        shutdown.cancel();
        task.await.unwrap();
    }
}
