// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/lifecycle.rs
// Version: 1.0.0
//
// This file binds local work production to consensus, located in the miner
// subdirectory. Work starts when consensus is established and stops when it
// is lost; the worker thread count is resolved once, at the first start.
//
// Tree Location:
// - src/miner/lifecycle.rs (work lifecycle controller)
// - Depends on: tokio, tracing

use crate::core::{MinedBlock, ThreadCount};
use tokio::sync::broadcast;
use tracing::{debug, info};

const BLOCK_CHANNEL_CAPACITY: usize = 16;

/// Handle to the external work engine
pub trait WorkEngine: Send + Sync {
    fn set_threads(&self, threads: usize);
    fn start_work(&self);
    /// Must tolerate being called when no work is running
    fn stop_work(&self);
}

pub struct WorkController<W> {
    engine: W,
    configured: ThreadCount,
    threads: Option<usize>,
    working: bool,
    blocks: broadcast::Sender<MinedBlock>,
}

impl<W: WorkEngine> WorkController<W> {
    pub fn new(engine: W, configured: ThreadCount) -> Self {
        let (blocks, _) = broadcast::channel(BLOCK_CHANNEL_CAPACITY);
        Self {
            engine,
            configured,
            threads: None,
            working: false,
            blocks,
        }
    }

    pub fn engine(&self) -> &W {
        &self.engine
    }

    /// Thread count fixed at the first `on_ready`
    pub fn threads(&self) -> Option<usize> {
        self.threads
    }

    pub fn is_working(&self) -> bool {
        self.working
    }

    /// Consensus established: start work.
    pub fn on_ready(&mut self) {
        if self.working {
            debug!("Work already running");
            return;
        }

        let threads = match self.threads {
            Some(threads) => threads,
            None => {
                let threads = self.configured.resolve();
                self.engine.set_threads(threads);
                self.threads = Some(threads);
                threads
            }
        };

        info!("⛏️ Starting work on {} threads", threads);
        self.engine.start_work();
        self.working = true;
    }

    /// Consensus lost: stop work. No-op when nothing runs.
    pub fn on_lost(&mut self) {
        if !self.working {
            debug!("Work not running, nothing to stop");
            return;
        }
        info!("⏸️ Stopping work until consensus is established again");
        self.engine.stop_work();
        self.working = false;
    }

    /// Log a produced block and pass it on to subscribers
    pub fn on_block_mined(&self, block: MinedBlock) {
        info!("💎 Block mined: #{}, hash={}", block.height, block.hash);
        // No subscribers is fine
        let _ = self.blocks.send(block);
    }

    pub fn subscribe_blocks(&self) -> broadcast::Receiver<MinedBlock> {
        self.blocks.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        SetThreads(usize),
        Start,
        Stop,
    }

    #[derive(Clone, Default)]
    struct RecordingEngine {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl RecordingEngine {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl WorkEngine for RecordingEngine {
        fn set_threads(&self, threads: usize) {
            self.calls.lock().unwrap().push(Call::SetThreads(threads));
        }

        fn start_work(&self) {
            self.calls.lock().unwrap().push(Call::Start);
        }

        fn stop_work(&self) {
            self.calls.lock().unwrap().push(Call::Stop);
        }
    }

    fn fixed(n: usize) -> ThreadCount {
        ThreadCount::Fixed(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn ready_lost_ready_starts_twice_and_stops_once() {
        let engine = RecordingEngine::default();
        let mut work = WorkController::new(engine.clone(), fixed(4));

        work.on_ready();
        work.on_lost();
        work.on_ready();

        assert_eq!(
            engine.calls(),
            vec![Call::SetThreads(4), Call::Start, Call::Stop, Call::Start]
        );
        assert!(work.is_working());
    }

    #[test]
    fn lost_without_ready_does_nothing() {
        let engine = RecordingEngine::default();
        let mut work = WorkController::new(engine.clone(), fixed(2));
        work.on_lost();
        assert!(engine.calls().is_empty());
        assert!(!work.is_working());
    }

    #[test]
    fn repeated_ready_does_not_restart() {
        let engine = RecordingEngine::default();
        let mut work = WorkController::new(engine.clone(), fixed(1));
        work.on_ready();
        work.on_ready();
        assert_eq!(engine.calls(), vec![Call::SetThreads(1), Call::Start]);
    }

    #[test]
    fn auto_threads_resolve_once() {
        let engine = RecordingEngine::default();
        let mut work = WorkController::new(engine.clone(), ThreadCount::Auto);
        assert_eq!(work.threads(), None);

        work.on_ready();
        work.on_lost();
        work.on_ready();

        assert_eq!(work.threads(), Some(num_cpus::get()));
        let set_calls = engine
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::SetThreads(_)))
            .count();
        assert_eq!(set_calls, 1);
    }

    #[tokio::test]
    async fn mined_blocks_reach_subscribers() {
        let work = WorkController::new(RecordingEngine::default(), fixed(1));
        let mut blocks = work.subscribe_blocks();
        let block = MinedBlock {
            height: 1_000_001,
            hash: "00ab".to_string(),
        };
        work.on_block_mined(block.clone());
        assert_eq!(blocks.recv().await.unwrap(), block);
    }
}
