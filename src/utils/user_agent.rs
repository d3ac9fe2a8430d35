/// Client identifier logged at startup, e.g. "pocket-miner 1.0.0 (linux)"
pub fn user_agent() -> String {
    format!(
        "pocket-miner {} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}
