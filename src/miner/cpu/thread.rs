// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/cpu/thread.rs
// Version: 1.0.0
//
// This file contains the individual work threads of the local CPU engine,
// located in the cpu subdirectory of the miner module. Each thread hashes
// its own nonce stride and adds its hash count to a shared counter until
// its run flag is cleared.

use sha3::{Digest, Sha3_256};
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use tracing::debug;

/// Hashes between two checks of the run flag
const HASHES_PER_ROUND: u64 = 1000;

/// Triple SHA3-256 over nonce || header || 0x01 for 4 consecutive nonces
pub fn hash_batch(header: &[u8], nonce: u64) -> [[u8; 32]; 4] {
    let mut input = Vec::with_capacity(header.len() + 9);
    input.extend_from_slice(&[0u8; 8]); // Placeholder for nonce
    input.extend_from_slice(header);
    input.push(1u8);

    let mut results = [[0u8; 32]; 4];
    for (i, result) in results.iter_mut().enumerate() {
        let n = nonce.wrapping_add(i as u64);
        input[0..8].copy_from_slice(&n.to_le_bytes());
        let hash1 = Sha3_256::digest(&input);
        let hash2 = Sha3_256::digest(hash1);
        let hash3 = Sha3_256::digest(hash2);
        result.copy_from_slice(&hash3);
    }
    results
}

pub fn start_work_thread(
    thread_id: usize,
    num_threads: usize,
    running: Arc<AtomicBool>,
    hashes: Arc<AtomicU64>,
) -> JoinHandle<()> {
    std::thread::spawn(move || work_thread(thread_id, num_threads, running, hashes))
}

fn work_thread(
    thread_id: usize,
    num_threads: usize,
    running: Arc<AtomicBool>,
    hashes: Arc<AtomicU64>,
) {
    debug!("Work thread {} started", thread_id);
    let header: [u8; 32] = rand::random();
    let mut nonce = rand::random::<u64>().wrapping_add(thread_id as u64);
    let stride = (4 * num_threads.max(1)) as u64;

    while running.load(Ordering::Relaxed) {
        for _ in (0..HASHES_PER_ROUND).step_by(4) {
            black_box(hash_batch(&header, nonce));
            nonce = nonce.wrapping_add(stride);
        }
        hashes.fetch_add(HASHES_PER_ROUND, Ordering::Relaxed);
    }
    debug!("Work thread {} stopped", thread_id);
}
