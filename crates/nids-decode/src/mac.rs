//! MAC address value type

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed six-byte hardware address with a canonical `aa:bb:cc:dd:ee:ff`
/// textual form.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub const BROADCAST: MacAddress = MacAddress([0xff; 6]);

    #[inline]
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xff; 6]
    }

    /// Group bit of the first octet (multicast and broadcast frames).
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid mac address: {0}")]
pub struct InvalidMacAddress(pub String);

impl FromStr for MacAddress {
    type Err = InvalidMacAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(|| InvalidMacAddress(s.into()))?;
            if part.len() != 2 {
                return Err(InvalidMacAddress(s.into()));
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| InvalidMacAddress(s.into()))?;
        }
        if parts.next().is_some() {
            return Err(InvalidMacAddress(s.into()));
        }
        Ok(MacAddress(octets))
    }
}
