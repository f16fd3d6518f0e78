//! Canonical protocol taxonomy
//!
//! `ProtocolType` is the shared vocabulary between packet decoding and rule
//! header validation: a decoded layer is tagged with one, and a rule's
//! protocol field resolves against the same set. Textual names round-trip
//! through `Display`/`FromStr` so external matchers can serialize them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One protocol, tagged with its stack level.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolType {
    Link(LinkProtocol),
    Network(NetworkProtocol),
    Transport(TransportProtocol),
    Application(ApplicationProtocol),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LinkProtocol {
    Ethernet,
    Vlan,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NetworkProtocol {
    Ipv4,
    Ipv6,
    Arp,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransportProtocol {
    Tcp,
    Udp,
    Icmp,
}

/// Application protocols decoded with a verified signature.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationProtocol {
    Dns,
    Http,
    Tls,
    ModbusReq,
    ModbusRsp,
}

/// Application protocols as heuristic labels.
///
/// Distinct from [`ApplicationProtocol`]: a naive value means "this payload
/// looks like X", not "this payload decoded as X". Request/response pairs
/// collapse into one name.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationNaiveProtocol {
    Dns,
    Http,
    Tls,
    Modbus,
}

impl From<ApplicationProtocol> for ApplicationNaiveProtocol {
    fn from(p: ApplicationProtocol) -> Self {
        match p {
            ApplicationProtocol::Dns => ApplicationNaiveProtocol::Dns,
            ApplicationProtocol::Http => ApplicationNaiveProtocol::Http,
            ApplicationProtocol::Tls => ApplicationNaiveProtocol::Tls,
            ApplicationProtocol::ModbusReq | ApplicationProtocol::ModbusRsp => {
                ApplicationNaiveProtocol::Modbus
            }
        }
    }
}

impl ProtocolType {
    /// Stack level: link < network < transport < application.
    pub fn stack_rank(&self) -> u8 {
        match self {
            ProtocolType::Link(_) => 0,
            ProtocolType::Network(_) => 1,
            ProtocolType::Transport(_) => 2,
            ProtocolType::Application(_) => 3,
        }
    }

    /// Stable lowercase name, the inverse of [`ProtocolType::from_str`].
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolType::Link(LinkProtocol::Ethernet) => "ethernet",
            ProtocolType::Link(LinkProtocol::Vlan) => "vlan",
            ProtocolType::Network(NetworkProtocol::Ipv4) => "ipv4",
            ProtocolType::Network(NetworkProtocol::Ipv6) => "ipv6",
            ProtocolType::Network(NetworkProtocol::Arp) => "arp",
            ProtocolType::Transport(TransportProtocol::Tcp) => "tcp",
            ProtocolType::Transport(TransportProtocol::Udp) => "udp",
            ProtocolType::Transport(TransportProtocol::Icmp) => "icmp",
            ProtocolType::Application(ApplicationProtocol::Dns) => "dns",
            ProtocolType::Application(ApplicationProtocol::Http) => "http",
            ProtocolType::Application(ApplicationProtocol::Tls) => "tls",
            ProtocolType::Application(ApplicationProtocol::ModbusReq) => "modbus_req",
            ProtocolType::Application(ApplicationProtocol::ModbusRsp) => "modbus_rsp",
        }
    }
}

impl fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for a protocol name outside the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProtocolName(pub String);

impl fmt::Display for UnknownProtocolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown protocol name: {}", self.0)
    }
}

impl std::error::Error for UnknownProtocolName {}

impl FromStr for ProtocolType {
    type Err = UnknownProtocolName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let p = match s {
            "ethernet" => ProtocolType::Link(LinkProtocol::Ethernet),
            "vlan" => ProtocolType::Link(LinkProtocol::Vlan),
            "ipv4" => ProtocolType::Network(NetworkProtocol::Ipv4),
            "ipv6" => ProtocolType::Network(NetworkProtocol::Ipv6),
            "arp" => ProtocolType::Network(NetworkProtocol::Arp),
            "tcp" => ProtocolType::Transport(TransportProtocol::Tcp),
            "udp" => ProtocolType::Transport(TransportProtocol::Udp),
            "icmp" => ProtocolType::Transport(TransportProtocol::Icmp),
            "dns" => ProtocolType::Application(ApplicationProtocol::Dns),
            "http" => ProtocolType::Application(ApplicationProtocol::Http),
            "tls" => ProtocolType::Application(ApplicationProtocol::Tls),
            "modbus_req" => ProtocolType::Application(ApplicationProtocol::ModbusReq),
            "modbus_rsp" => ProtocolType::Application(ApplicationProtocol::ModbusRsp),
            _ => return Err(UnknownProtocolName(s.to_string())),
        };
        Ok(p)
    }
}

impl ApplicationNaiveProtocol {
    pub fn name(&self) -> &'static str {
        match self {
            ApplicationNaiveProtocol::Dns => "dns",
            ApplicationNaiveProtocol::Http => "http",
            ApplicationNaiveProtocol::Tls => "tls",
            ApplicationNaiveProtocol::Modbus => "modbus",
        }
    }
}

impl fmt::Display for ApplicationNaiveProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApplicationNaiveProtocol {
    type Err = UnknownProtocolName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dns" => Ok(Self::Dns),
            "http" => Ok(Self::Http),
            "tls" => Ok(Self::Tls),
            "modbus" => Ok(Self::Modbus),
            _ => Err(UnknownProtocolName(s.to_string())),
        }
    }
}

impl From<LinkProtocol> for ProtocolType {
    fn from(p: LinkProtocol) -> Self {
        ProtocolType::Link(p)
    }
}

impl From<NetworkProtocol> for ProtocolType {
    fn from(p: NetworkProtocol) -> Self {
        ProtocolType::Network(p)
    }
}

impl From<TransportProtocol> for ProtocolType {
    fn from(p: TransportProtocol) -> Self {
        ProtocolType::Transport(p)
    }
}

impl From<ApplicationProtocol> for ProtocolType {
    fn from(p: ApplicationProtocol) -> Self {
        ProtocolType::Application(p)
    }
}
