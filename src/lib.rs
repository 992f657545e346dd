//! wg-split - Split-tunnel AllowedIPs generator for WireGuard
//!
//! Computes the routing policy for a split-tunnel WireGuard VPN: the
//! whole IPv4 space minus the ranges that should go direct (reserved
//! ranges and an externally supplied country-IP list), canonicalized to
//! the minimal CIDR set, compressed under a route-count budget, and
//! patched into WireGuard config files as the `AllowedIPs` directive.
//!
//! # Architecture
//!
//! - `policy`: the address-set algebra engine (pure, no I/O)
//! - `netlist`: bypass-list loading (file or HTTPS) and reserved ranges
//! - `wgconf`: AllowedIPs rendering and config-template patching
//! - `config`: configuration file handling (TOML)
//!
//! # Usage
//!
//! ```bash
//! wg-split generate --output-dir vpn-output
//! ```

pub mod config;
pub mod netlist;
pub mod policy;
pub mod wgconf;

pub use config::Config;
pub use policy::{Block, PolicyBuilder, PolicyInput, PolicyOutput};
