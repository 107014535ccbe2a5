//! Core type definitions with strong typing and validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::{Error, Result};

/// Kernel interface index
///
/// Index 0 is never assigned by the kernel and means "unset".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct IfIndex(u32);

impl IfIndex {
    /// The unset index
    pub const UNSET: Self = Self(0);

    /// Create from raw index
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Get raw index value
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Check if an index has been configured
    #[must_use]
    pub const fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for IfIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for IfIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl From<IfIndex> for u32 {
    fn from(index: IfIndex) -> Self {
        index.0
    }
}

/// IP address with prefix length, e.g. `192.168.200.1/24`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpPrefix {
    addr: IpAddr,
    prefix_len: u8,
}

impl IpPrefix {
    /// Create a new `IpPrefix` with validation
    ///
    /// # Errors
    /// Returns error if the prefix length exceeds the address width
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self> {
        let max = Self::max_len(addr);
        if prefix_len > max {
            return Err(Error::InvalidConfig {
                message: format!("Prefix length {prefix_len} too long for {addr} (max {max})"),
            });
        }
        Ok(Self { addr, prefix_len })
    }

    /// Host prefix (/32 or /128) for an address
    #[must_use]
    pub const fn host(addr: IpAddr) -> Self {
        Self {
            addr,
            prefix_len: Self::max_len(addr),
        }
    }

    const fn max_len(addr: IpAddr) -> u8 {
        match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        }
    }

    /// Get the address
    #[must_use]
    pub const fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Get the prefix length
    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

impl FromStr for IpPrefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidConfig {
            message: format!("Invalid prefix '{s}': {reason}"),
        };

        match s.split_once('/') {
            Some((addr, len)) => {
                let addr: IpAddr = addr.parse().map_err(|e| invalid(format!("{e}")))?;
                let len: u8 = len.parse().map_err(|e| invalid(format!("{e}")))?;
                Self::new(addr, len)
            }
            None => {
                let addr: IpAddr = s.parse().map_err(|e| invalid(format!("{e}")))?;
                Ok(Self::host(addr))
            }
        }
    }
}

impl TryFrom<String> for IpPrefix {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<IpPrefix> for String {
    fn from(prefix: IpPrefix) -> Self {
        prefix.to_string()
    }
}
