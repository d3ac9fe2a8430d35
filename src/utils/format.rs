// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/utils/format.rs
// Version: 1.0.0
//
// This file provides utility functions for formatting statistics in the
// miner, located in the utils subdirectory. It formats hashrate, balances and
// durations for consistent output in logs and reports.
//
// Tree Location:
// - src/utils/format.rs (formatting utilities)
// - Depends on: std

use std::time::Duration;

const HASHRATE_THRESHOLD: f64 = 1000.0;
const HASHRATE_UNITS: [&str; 8] = [
    "kH/s", "MH/s", "GH/s", "TH/s", "PH/s", "EH/s", "ZH/s", "YH/s",
];

/// Smallest balance units per coin
pub const UNITS_PER_COIN: u64 = 100_000;

/// Utility functions for formatting miner statistics
pub struct FormatUtils;

impl FormatUtils {
    /// Format hashrate with an adaptive unit.
    ///
    /// Below 1000 the value is printed as-is (`"30 H/s"`, `"12.5 H/s"`). From 1000 up it
    /// is divided by 1000 until it drops below 1000 or the largest unit is reached, and
    /// printed with one decimal (`"1.0 kH/s"`, `"1.5 MH/s"`).
    pub fn format_hashrate(hashrate: f64) -> String {
        if !hashrate.is_finite() || hashrate.abs() < HASHRATE_THRESHOLD {
            return format!("{} H/s", hashrate);
        }

        let mut value = hashrate;
        let mut unit = 0;
        loop {
            value /= HASHRATE_THRESHOLD;
            if value.abs() < HASHRATE_THRESHOLD || unit == HASHRATE_UNITS.len() - 1 {
                break;
            }
            unit += 1;
        }
        format!("{:.1} {}", value, HASHRATE_UNITS[unit])
    }

    /// Format a raw balance as coins, without trailing zeros
    pub fn format_coins(units: u64) -> String {
        let whole = units / UNITS_PER_COIN;
        let fraction = units % UNITS_PER_COIN;
        if fraction == 0 {
            return whole.to_string();
        }
        let fraction = format!("{:05}", fraction);
        format!("{}.{}", whole, fraction.trim_end_matches('0'))
    }

    /// Format elapsed time in seconds with millisecond precision
    pub fn format_elapsed(duration: Duration) -> String {
        format!("{:.3}s", duration.as_secs_f64())
    }
}
