//! Rule header element types

use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use ipnetwork::Ipv4Network;
use nids_decode::{ApplicationNaiveProtocol, NetworkProtocol, Packet, TransportProtocol};
use serde::{Deserialize, Serialize};

use crate::error::RuleParseError;

/// Rule action.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Alert,
    Pass,
    Drop,
    Reject,
    RejectSrc,
    RejectDst,
    RejectBoth,
}

impl FromStr for Action {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alert" => Ok(Self::Alert),
            "pass" => Ok(Self::Pass),
            "drop" => Ok(Self::Drop),
            "reject" => Ok(Self::Reject),
            "rejectsrc" => Ok(Self::RejectSrc),
            "rejectdst" => Ok(Self::RejectDst),
            "rejectboth" => Ok(Self::RejectBoth),
            _ => Err(RuleParseError::InvalidAction(s.to_string())),
        }
    }
}

/// Protocols a rule header may name. Closed vocabulary drawn from the
/// decode taxonomy; anything else is an `UnrecognizedProtocol` error at
/// parse time, never a silent wildcard.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RuleProtocol {
    Ip,
    Tcp,
    Udp,
    Icmp,
    Dns,
    Http,
    Tls,
    Modbus,
}

impl RuleProtocol {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "ip" => Some(Self::Ip),
            "tcp" => Some(Self::Tcp),
            "udp" => Some(Self::Udp),
            "icmp" => Some(Self::Icmp),
            "dns" => Some(Self::Dns),
            "http" => Some(Self::Http),
            "tls" | "ssl" => Some(Self::Tls),
            "modbus" => Some(Self::Modbus),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ip => "ip",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
            Self::Dns => "dns",
            Self::Http => "http",
            Self::Tls => "tls",
            Self::Modbus => "modbus",
        }
    }

    /// Is this rule applicable to the decoded packet's protocol stack?
    ///
    /// Application protocols compare through the naive vocabulary so a
    /// heuristically-labeled payload still counts.
    pub fn matches(&self, packet: &Packet<'_>) -> bool {
        match self {
            Self::Ip => packet.network().is_some_and(|n| {
                matches!(
                    n.protocol(),
                    NetworkProtocol::Ipv4 | NetworkProtocol::Ipv6
                )
            }),
            Self::Tcp => self.transport_matches(packet, TransportProtocol::Tcp),
            Self::Udp => self.transport_matches(packet, TransportProtocol::Udp),
            Self::Icmp => self.transport_matches(packet, TransportProtocol::Icmp),
            Self::Dns => packet.app_protocol() == Some(ApplicationNaiveProtocol::Dns),
            Self::Http => packet.app_protocol() == Some(ApplicationNaiveProtocol::Http),
            Self::Tls => packet.app_protocol() == Some(ApplicationNaiveProtocol::Tls),
            Self::Modbus => packet.app_protocol() == Some(ApplicationNaiveProtocol::Modbus),
        }
    }

    fn transport_matches(&self, packet: &Packet<'_>, proto: TransportProtocol) -> bool {
        packet.transport().is_some_and(|t| t.protocol() == proto)
    }
}

/// Rule direction: `->` (one-way) or `<>` (either way).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    #[serde(rename = "uni")]
    Uni,
    #[serde(rename = "bi")]
    Bi,
}

/// Address list element: one host or one CIDR range.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum IpAddress {
    Addr(Ipv4Addr),
    Range(Ipv4Network),
}

impl IpAddress {
    pub fn contains(&self, ip: &Ipv4Addr) -> bool {
        match self {
            Self::Addr(addr) => addr == ip,
            Self::Range(net) => net.contains(*ip),
        }
    }
}

/// Source/destination address spec. `accept: None` means any address;
/// `except` carries negated entries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct IpAddressList {
    pub accept: Option<Vec<IpAddress>>,
    pub except: Option<Vec<IpAddress>>,
}

impl IpAddressList {
    pub fn is_any(&self) -> bool {
        self.accept.is_none() && self.except.is_none()
    }

    pub fn allows(&self, ip: &IpAddr) -> bool {
        let IpAddr::V4(v4) = ip else {
            // v6 only matches a fully-unconstrained spec
            return self.is_any();
        };
        if let Some(except) = &self.except {
            if except.iter().any(|e| e.contains(v4)) {
                return false;
            }
        }
        match &self.accept {
            Some(accept) => accept.iter().any(|a| a.contains(v4)),
            None => true,
        }
    }
}

/// Port list element: one port or one inclusive range.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Port {
    Single(u16),
    Range { min: u16, max: u16 },
}

impl Port {
    pub fn new_range(min: u16, max: u16) -> Result<Self, RuleParseError> {
        if max < min {
            return Err(RuleParseError::InvalidPort(format!(
                "range {min}:{max} has max below min"
            )));
        }
        Ok(Port::Range { min, max })
    }

    pub fn contains(&self, port: u16) -> bool {
        match self {
            Self::Single(p) => *p == port,
            Self::Range { min, max } => *min <= port && port <= *max,
        }
    }
}

/// Source/destination port spec, same accept/except shape as addresses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct PortList {
    pub accept: Option<Vec<Port>>,
    pub except: Option<Vec<Port>>,
}

impl PortList {
    pub fn is_any(&self) -> bool {
        self.accept.is_none() && self.except.is_none()
    }

    pub fn allows(&self, port: u16) -> bool {
        if let Some(except) = &self.except {
            if except.iter().any(|e| e.contains(port)) {
                return false;
            }
        }
        match &self.accept {
            Some(accept) => accept.iter().any(|a| a.contains(port)),
            None => true,
        }
    }
}

/// Accept/except list shape shared by addresses and ports, so one list
/// grammar parses both.
pub(crate) trait RuleList: Default {
    type Element: FromStr<Err = RuleParseError>;

    fn accept_mut(&mut self) -> &mut Option<Vec<Self::Element>>;
    fn except_mut(&mut self) -> &mut Option<Vec<Self::Element>>;
}

impl RuleList for IpAddressList {
    type Element = IpAddress;

    fn accept_mut(&mut self) -> &mut Option<Vec<IpAddress>> {
        &mut self.accept
    }

    fn except_mut(&mut self) -> &mut Option<Vec<IpAddress>> {
        &mut self.except
    }
}

impl RuleList for PortList {
    type Element = Port;

    fn accept_mut(&mut self) -> &mut Option<Vec<Port>> {
        &mut self.accept
    }

    fn except_mut(&mut self) -> &mut Option<Vec<Port>> {
        &mut self.except
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn port_range_validation() {
        assert!(Port::new_range(80, 82).is_ok());
        assert!(matches!(
            Port::new_range(82, 80),
            Err(RuleParseError::InvalidPort(_))
        ));
    }

    #[test]
    fn address_list_except_wins() {
        let list = IpAddressList {
            accept: Some(vec![IpAddress::Range(
                Ipv4Network::from_str("10.0.0.0/8").unwrap(),
            )]),
            except: Some(vec![IpAddress::Addr(Ipv4Addr::new(10, 0, 0, 7))]),
        };
        assert!(list.allows(&IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3))));
        assert!(!list.allows(&IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))));
        assert!(!list.allows(&IpAddr::V4(Ipv4Addr::new(192, 168, 0, 1))));
    }

    #[test]
    fn any_list_allows_everything() {
        let list = PortList::default();
        assert!(list.is_any());
        assert!(list.allows(0));
        assert!(list.allows(65535));
    }
}
