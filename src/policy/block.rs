//! CIDR block value type
//!
//! A [`Block`] is a single IPv4 CIDR range: a base address plus a prefix
//! length. The low `32 - prefix` bits of the base are always zero; the
//! constructors either reject or mask unaligned input, so every `Block`
//! in the system is address-aligned by construction.
//!
//! Blocks order by base address ascending, then by prefix length
//! ascending (more specific last), which keeps rendered output
//! deterministic.

use crate::policy::PolicyError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block {
    base: u32,
    prefix: u8,
}

/// Network mask for a prefix length: the high `prefix` bits set.
fn netmask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    }
}

impl Block {
    /// The entire IPv4 address space, `0.0.0.0/0`.
    pub const FULL: Block = Block { base: 0, prefix: 0 };

    /// Construct a block, rejecting unaligned base bits.
    pub fn new(base: u32, prefix: u8) -> Result<Self, PolicyError> {
        if prefix > 32 {
            return Err(PolicyError::InvalidNetworkSyntax(format!(
                "prefix length /{} out of range",
                prefix
            )));
        }
        if base & !netmask(prefix) != 0 {
            return Err(PolicyError::InvalidNetworkSyntax(format!(
                "{}/{} has host bits set",
                Ipv4Addr::from(base),
                prefix
            )));
        }
        Ok(Self { base, prefix })
    }

    /// Construct a block known to be aligned (internal use).
    pub(crate) fn new_unchecked(base: u32, prefix: u8) -> Self {
        debug_assert!(prefix <= 32);
        debug_assert_eq!(base & !netmask(prefix), 0, "unaligned base");
        Self { base, prefix }
    }

    /// Parse a CIDR token, masking host bits instead of rejecting them.
    ///
    /// Tolerates loosely formatted sources: `10.0.0.1/8` becomes
    /// `10.0.0.0/8`, and a bare address is treated as a `/32`.
    pub fn parse_lenient(s: &str) -> Result<Self, PolicyError> {
        let (addr, prefix) = split_cidr(s)?;
        Ok(Self {
            base: u32::from(addr) & netmask(prefix),
            prefix,
        })
    }

    pub fn addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.base)
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// First address in the range, as an integer.
    pub fn first(&self) -> u32 {
        self.base
    }

    /// Last address in the range, as an integer.
    pub fn last(&self) -> u32 {
        self.base | !netmask(self.prefix)
    }

    /// True iff the two address ranges intersect.
    pub fn overlaps(&self, other: Block) -> bool {
        self.first() <= other.last() && other.first() <= self.last()
    }

    /// True iff `other`'s range is a subset of this block's range
    /// (equality included).
    pub fn contains(&self, other: Block) -> bool {
        self.prefix <= other.prefix && (other.base & netmask(self.prefix)) == self.base
    }

    /// The ancestor block at a shorter prefix length.
    pub fn supernet(&self, new_prefix: u8) -> Block {
        debug_assert!(new_prefix <= self.prefix);
        Block {
            base: self.base & netmask(new_prefix),
            prefix: new_prefix,
        }
    }
}

fn split_cidr(s: &str) -> Result<(Ipv4Addr, u8), PolicyError> {
    let s = s.trim();
    let (addr_str, prefix) = match s.split_once('/') {
        Some((a, p)) => {
            let prefix: u8 = p
                .parse()
                .map_err(|_| PolicyError::InvalidNetworkSyntax(s.to_string()))?;
            if prefix > 32 {
                return Err(PolicyError::InvalidNetworkSyntax(s.to_string()));
            }
            (a, prefix)
        }
        // Bare address means a single host
        None => (s, 32),
    };
    let addr: Ipv4Addr = addr_str
        .parse()
        .map_err(|_| PolicyError::InvalidNetworkSyntax(s.to_string()))?;
    Ok((addr, prefix))
}

impl FromStr for Block {
    type Err = PolicyError;

    /// Strict parse: host bits below the prefix must be zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = split_cidr(s)?;
        Self::new(u32::from(addr), prefix)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.addr(), self.prefix)
    }
}

impl Serialize for Block {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D>(deserializer: D) -> Result<Block, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
