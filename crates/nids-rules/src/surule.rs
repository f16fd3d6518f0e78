//! Parsed rule representation

use nids_decode::Packet;
use serde::{Deserialize, Serialize};

use crate::options::SuruleOption;
use crate::types::{Action, Direction, IpAddressList, PortList, RuleProtocol};

/// Rule header: who the rule talks about and in which direction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RuleHeader {
    pub action: Action,
    pub protocol: RuleProtocol,
    pub src_addr: IpAddressList,
    pub src_port: PortList,
    pub direction: Direction,
    pub dst_addr: IpAddressList,
    pub dst_port: PortList,
}

impl RuleHeader {
    /// Stateless applicability check against a decoded packet: protocol,
    /// addresses and ports, honoring `<>` bidirectionality. Option
    /// evaluation (content, pcre, ...) is a matter for a real matcher.
    pub fn matches(&self, packet: &Packet<'_>) -> bool {
        if !self.protocol.matches(packet) {
            return false;
        }

        let src_ip = packet.src_ip();
        let dst_ip = packet.dst_ip();
        let src_port = packet.src_port();
        let dst_port = packet.dst_port();

        let ip_ok = |list: &IpAddressList, ip: &Option<std::net::IpAddr>| match ip {
            Some(ip) => list.allows(ip),
            None => list.is_any(),
        };
        let port_ok = |list: &PortList, port: &Option<u16>| match port {
            Some(port) => list.allows(*port),
            None => list.is_any(),
        };

        let forward = ip_ok(&self.src_addr, &src_ip)
            && ip_ok(&self.dst_addr, &dst_ip)
            && port_ok(&self.src_port, &src_port)
            && port_ok(&self.dst_port, &dst_port);
        match self.direction {
            Direction::Uni => forward,
            Direction::Bi => {
                forward
                    || (ip_ok(&self.src_addr, &dst_ip)
                        && ip_ok(&self.dst_addr, &src_ip)
                        && port_ok(&self.src_port, &dst_port)
                        && port_ok(&self.dst_port, &src_port))
            }
        }
    }
}

/// One parsed Suricata-compatible rule: header plus options in source
/// order. Immutable once parsed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Surule {
    pub header: RuleHeader,
    pub options: Vec<SuruleOption>,
}

impl Surule {
    pub fn new(header: RuleHeader, options: Vec<SuruleOption>) -> Self {
        Self { header, options }
    }

    pub fn action(&self) -> Action {
        self.header.action
    }

    pub fn sid(&self) -> Option<u64> {
        self.options.iter().find_map(|o| match o {
            SuruleOption::Sid(sid) => Some(*sid),
            _ => None,
        })
    }

    pub fn message(&self) -> Option<&str> {
        self.options.iter().find_map(|o| match o {
            SuruleOption::Message(msg) => Some(msg.as_str()),
            _ => None,
        })
    }

    /// Header-level applicability against a decoded packet.
    pub fn applies_to(&self, packet: &Packet<'_>) -> bool {
        self.header.matches(packet)
    }
}
