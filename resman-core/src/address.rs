use anyhow::anyhow;
use std::{fmt, str};

/// The address of a node in the simulated DTN
///
/// Addresses are dense integers drawn from the configured
/// [`DestinationRange`]. They double as the handle the host uses to
/// reach a node.
///
/// [`DestinationRange`]: crate::config::DestinationRange
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(C)]
pub struct Address(u32);

impl Address {
    pub const ZERO: Self = Address::new(0);

    pub const fn new(address: u32) -> Self {
        Self(address)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for Address {
    fn from(address: u32) -> Self {
        Self::new(address)
    }
}

impl From<Address> for u32 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl From<Address> for u64 {
    fn from(address: Address) -> Self {
        u64::from(address.0)
    }
}

impl str::FromStr for Address {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|error| anyhow!("invalid address `{s}': {error}"))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}
