// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/cpu/miner.rs
// Version: 1.0.0
//
// This file implements the local CPU work engine driven by the work
// lifecycle controller. It runs one hashing thread per configured worker and
// a sampler thread that publishes the measured hashrate as WorkEvents.

use super::thread::start_work_thread;
use crate::core::WorkEvent;
use crate::miner::lifecycle::WorkEngine;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

pub struct CpuWorkEngine {
    threads: AtomicUsize,
    events: UnboundedSender<WorkEvent>,
    hashes: Arc<AtomicU64>,
    // Run flag of the current generation; stopping clears it and drops it
    running: Mutex<Option<Arc<AtomicBool>>>,
    sample_interval: Duration,
}

impl CpuWorkEngine {
    pub fn new(events: UnboundedSender<WorkEvent>) -> Self {
        Self {
            threads: AtomicUsize::new(num_cpus::get()),
            events,
            hashes: Arc::new(AtomicU64::new(0)),
            running: Mutex::new(None),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }

    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn start_sampler(&self, running: Arc<AtomicBool>) {
        let hashes = Arc::clone(&self.hashes);
        let events = self.events.clone();
        let interval = self.sample_interval;

        std::thread::spawn(move || {
            let mut last = Instant::now();
            hashes.store(0, Ordering::Relaxed);
            loop {
                std::thread::sleep(interval);
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                let elapsed = last.elapsed().as_secs_f64();
                last = Instant::now();
                let counted = hashes.swap(0, Ordering::Relaxed);
                let rate = if elapsed > 0.0 { counted as f64 / elapsed } else { 0.0 };
                if events.send(WorkEvent::HashrateChanged(rate.round())).is_err() {
                    break;
                }
            }
            debug!("Hashrate sampler stopped");
        });
    }
}

impl WorkEngine for CpuWorkEngine {
    fn set_threads(&self, threads: usize) {
        self.threads.store(threads.max(1), Ordering::Relaxed);
    }

    fn start_work(&self) {
        let mut current = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if current.is_some() {
            return;
        }

        let threads = self.threads();
        let running = Arc::new(AtomicBool::new(true));
        for thread_id in 0..threads {
            start_work_thread(thread_id, threads, Arc::clone(&running), Arc::clone(&self.hashes));
        }
        self.start_sampler(Arc::clone(&running));
        info!("🧵 {} work threads running", threads);
        *current = Some(running);
    }

    fn stop_work(&self) {
        if let Some(running) = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            running.store(false, Ordering::Relaxed);
            info!("🧵 Work threads stopping");
        }
    }
}

impl Drop for CpuWorkEngine {
    fn drop(&mut self) {
        self.stop_work();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn running_engine_reports_hashrate() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = CpuWorkEngine::new(tx).with_sample_interval(Duration::from_millis(50));
        engine.set_threads(1);
        engine.start_work();
        assert!(engine.is_running());

        match rx.recv().await {
            Some(WorkEvent::HashrateChanged(rate)) => assert!(rate >= 0.0),
            other => panic!("unexpected event {:?}", other),
        }

        engine.stop_work();
        assert!(!engine.is_running());
    }

    #[test]
    fn stop_without_start_is_harmless() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = CpuWorkEngine::new(tx);
        engine.stop_work();
        engine.stop_work();
        assert!(!engine.is_running());
    }

    #[test]
    fn thread_count_is_at_least_one() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = CpuWorkEngine::new(tx);
        engine.set_threads(0);
        assert_eq!(engine.threads(), 1);
    }
}
