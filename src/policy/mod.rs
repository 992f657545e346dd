//! Address-set algebra engine
//!
//! This module computes the split-tunnel routing policy as pure set
//! algebra over IPv4 CIDR blocks:
//!
//! 1. Start from the whole address space
//! 2. Subtract every bypass range (`exclude`)
//! 3. Canonicalize to the minimal CIDR representation (`collapse`)
//! 4. Widen blocks under a route-count budget (`aggregate`)
//! 5. Force coverage of the VPN-internal subnets (`builder`)
//!
//! The engine does no I/O and holds no state between invocations: the
//! same input always yields the same canonical output, independent of
//! exclusion ordering.

pub mod aggregate;
pub mod block;
pub mod builder;
pub mod collapse;
pub mod exclude;

pub use aggregate::{aggregate, AggregateResult};
pub use block::Block;
pub use builder::{PolicyBuilder, PolicyInput, PolicyOutput, DEFAULT_BLOCK_CAP, DEFAULT_FLOOR_PREFIX};
pub use collapse::collapse;
pub use exclude::{subtract, subtract_all};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Invalid network syntax: {0}")]
    InvalidNetworkSyntax(String),
    #[error("Intermediate block count {count} exceeded safety cap {cap}")]
    ResourceExhausted { count: usize, cap: usize },
    #[error("Invalid aggregation floor /{0}: prefix length must be 0..=32")]
    InvalidFloorPrefix(u8),
}
