// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPv4 subnet arithmetic for cloud-config ranges.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use bbl_core::BblError;

/// Hosts kept away from the director's IP allocator: the gateway's
/// neighbours plus the jumpbox and director themselves.
pub const RESERVED_HOSTS: (u32, u32) = (2, 6);
/// Hosts handed out as static IPs to deployments.
pub const STATIC_HOSTS: (u32, u32) = (200, 250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of addresses in the block.
    fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }

    /// The `n`th address of the block, like terraform's `cidrhost`.
    pub fn host(&self, n: u32) -> Option<Ipv4Addr> {
        if u64::from(n) >= self.size() {
            return None;
        }
        Some(Ipv4Addr::from(u32::from(self.network) + n))
    }

    /// `first-last` range string, as the director expects in a subnet.
    pub fn range(&self, (first, last): (u32, u32)) -> Result<String, BblError> {
        match (self.host(first), self.host(last)) {
            (Some(a), Some(b)) => Ok(format!("{a}-{b}")),
            _ => Err(BblError::UserInput(format!(
                "subnet {self} is too small: it needs at least {} addresses",
                u64::from(last) + 1
            ))),
        }
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = BblError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BblError::UserInput(format!("{s:?} is not a valid IPv4 CIDR block"));
        let (addr, prefix) = s.trim().split_once('/').ok_or_else(invalid)?;
        let addr: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
        if prefix > 32 {
            return Err(invalid());
        }
        let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - u32::from(prefix)) };
        Ok(Self { network: Ipv4Addr::from(u32::from(addr) & mask), prefix })
    }
}

#[cfg(test)]
#[path = "cidr_tests.rs"]
mod tests;
