// Pocket Miner - Free and Open Source Software Statement
//
// This project, pocket-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/utils/device.rs
// Version: 1.0.0
//
// This file derives the device name reported to the pool, located in the
// utils subdirectory. A name of "*" (or an empty name) is replaced with one
// built from the host's local address, OS, architecture and kernel release.
//
// Tree Location:
// - src/utils/device.rs (device naming)
// - Depends on: sysinfo, std

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use sysinfo::System;
use tracing::info;

/// Device name placeholder asking for an automatic name
pub const AUTO_DEVICE_NAME: &str = "*";

/// Return `name` unless it asks for an automatic device name
pub fn resolve_device_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() || name == AUTO_DEVICE_NAME {
        let auto = auto_device_name();
        info!("Device name set automatically to {}", auto);
        auto
    } else {
        name.to_string()
    }
}

/// "<local ip> <os> <arch> <kernel release>"
pub fn auto_device_name() -> String {
    let mut parts = vec![
        local_ip().to_string(),
        std::env::consts::OS.to_string(),
        std::env::consts::ARCH.to_string(),
    ];
    if let Some(release) = System::kernel_version() {
        parts.push(release);
    }
    parts.join(" ")
}

// Routing lookup only, connecting a UDP socket sends nothing
fn local_ip() -> IpAddr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_names_are_kept() {
        assert_eq!(resolve_device_name("rig-01"), "rig-01");
        assert_eq!(resolve_device_name("  office pc "), "office pc");
    }

    #[test]
    fn placeholder_builds_name_from_host() {
        let name = resolve_device_name("*");
        assert!(name.contains(std::env::consts::OS));
        assert!(name.contains(std::env::consts::ARCH));
        assert_eq!(resolve_device_name(""), auto_device_name());
    }
}
