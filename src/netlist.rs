//! Bypass-list loading
//!
//! The bypass list is the externally supplied set of CIDR ranges that
//! must go direct instead of through the tunnel (typically a per-country
//! list such as <https://ipv4.fetus.jp/ru.txt>). It can be loaded from a
//! local file or fetched over HTTPS; blank lines and `#` comments are
//! skipped, and unparsable entries are dropped with a count kept for
//! observability rather than failing the whole run.
//!
//! The RFC1918 and special-purpose ranges that always bypass the tunnel
//! live here as well.

use crate::policy::Block;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ListError {
    #[error("Failed to read list file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to fetch list: {0}")]
    FetchError(#[from] reqwest::Error),
}

pub const DEFAULT_LIST_URL: &str = "https://ipv4.fetus.jp/ru.txt";

const USER_AGENT: &str = concat!("wg-split/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// RFC1918 and special-purpose ranges that always go direct.
pub const RESERVED_RANGES: [&str; 14] = [
    "0.0.0.0/8",        // "This" network
    "10.0.0.0/8",       // RFC1918 private
    "100.64.0.0/10",    // Shared address space (CGNAT)
    "127.0.0.0/8",      // Loopback
    "169.254.0.0/16",   // Link-local
    "172.16.0.0/12",    // RFC1918 private
    "192.0.0.0/24",     // IETF Protocol Assignments
    "192.168.0.0/16",   // RFC1918 private
    "198.18.0.0/15",    // Benchmarking
    "198.51.100.0/24",  // Documentation
    "203.0.113.0/24",   // Documentation
    "224.0.0.0/4",      // Multicast
    "240.0.0.0/4",      // Reserved
    "255.255.255.255/32",
];

pub fn reserved_ranges() -> Vec<Block> {
    RESERVED_RANGES
        .iter()
        .map(|s| s.parse().expect("reserved range table is well-formed"))
        .collect()
}

/// A parsed bypass list plus the number of entries that were dropped.
#[derive(Debug, Clone)]
pub struct BypassList {
    pub blocks: Vec<Block>,
    pub skipped: usize,
}

/// Parse raw list text: one CIDR per line, `#` comments and blank lines
/// ignored, host bits masked, unparsable entries counted and dropped.
pub fn parse_list(text: &str) -> BypassList {
    let mut blocks = Vec::new();
    let mut skipped = 0;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match Block::parse_lenient(line) {
            Ok(block) => blocks.push(block),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("Skipped {} unparsable list entries", skipped);
    }
    info!("Loaded {} bypass blocks", blocks.len());
    BypassList { blocks, skipped }
}

/// Load the bypass list from a local file when it exists, otherwise
/// fetch it from `url`.
pub async fn load(path: Option<&Path>, url: &str) -> Result<BypassList, ListError> {
    let text = match path {
        Some(p) if p.exists() => {
            info!("Loading bypass list from file: {}", p.display());
            std::fs::read_to_string(p)?
        }
        Some(p) => {
            warn!("List file {} not found, fetching instead", p.display());
            fetch(url).await?
        }
        None => fetch(url).await?,
    };
    Ok(parse_list(&text))
}

async fn fetch(url: &str) -> Result<String, ListError> {
    info!("Fetching bypass list from {}", url);
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()?;
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}
