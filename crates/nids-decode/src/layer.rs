//! Decoded layer representations

use std::net::IpAddr;

use crate::decoders::{
    ArpHeader, DnsMessage, EthernetHeader, HttpHeader, IcmpHeader, Ipv4Header, Ipv6Header,
    ModbusReqHeader, ModbusRspHeader, TcpHeader, TlsHeader, UdpHeader, VlanHeader,
};
use crate::mac::MacAddress;
use crate::protocol::{
    ApplicationProtocol, LinkProtocol, NetworkProtocol, TransportProtocol,
};

/// Link-level content. VLAN tags decode as their own link layers, so a
/// QinQ frame carries one Ethernet layer followed by two VLAN layers.
#[derive(Debug, PartialEq, Clone)]
pub enum LinkLayer {
    Ethernet(EthernetHeader),
    Vlan(VlanHeader),
}

impl LinkLayer {
    pub fn protocol(&self) -> LinkProtocol {
        match self {
            LinkLayer::Ethernet(_) => LinkProtocol::Ethernet,
            LinkLayer::Vlan(_) => LinkProtocol::Vlan,
        }
    }

    #[inline]
    pub fn dst_mac(&self) -> Option<&MacAddress> {
        match self {
            LinkLayer::Ethernet(eth) => Some(&eth.dst_mac),
            LinkLayer::Vlan(_) => None,
        }
    }

    #[inline]
    pub fn src_mac(&self) -> Option<&MacAddress> {
        match self {
            LinkLayer::Ethernet(eth) => Some(&eth.src_mac),
            LinkLayer::Vlan(_) => None,
        }
    }
}

/// Network-level content.
#[derive(Debug, PartialEq, Clone)]
pub enum NetworkLayer<'a> {
    Ipv4(Ipv4Header<'a>),
    Ipv6(Ipv6Header<'a>),
    Arp(ArpHeader),
}

impl NetworkLayer<'_> {
    pub fn protocol(&self) -> NetworkProtocol {
        match self {
            NetworkLayer::Ipv4(_) => NetworkProtocol::Ipv4,
            NetworkLayer::Ipv6(_) => NetworkProtocol::Ipv6,
            NetworkLayer::Arp(_) => NetworkProtocol::Arp,
        }
    }

    #[inline]
    pub fn src_ip(&self) -> Option<IpAddr> {
        match self {
            NetworkLayer::Ipv4(ip) => Some(IpAddr::V4(ip.src_ip)),
            NetworkLayer::Ipv6(ip) => Some(IpAddr::V6(ip.src_ip)),
            NetworkLayer::Arp(arp) => Some(IpAddr::V4(arp.sender_ip)),
        }
    }

    #[inline]
    pub fn dst_ip(&self) -> Option<IpAddr> {
        match self {
            NetworkLayer::Ipv4(ip) => Some(IpAddr::V4(ip.dst_ip)),
            NetworkLayer::Ipv6(ip) => Some(IpAddr::V6(ip.dst_ip)),
            NetworkLayer::Arp(arp) => Some(IpAddr::V4(arp.target_ip)),
        }
    }
}

/// Transport-level content.
#[derive(Debug, PartialEq, Clone)]
pub enum TransportLayer<'a> {
    Tcp(TcpHeader<'a>),
    Udp(UdpHeader),
    Icmp(IcmpHeader),
}

impl TransportLayer<'_> {
    pub fn protocol(&self) -> TransportProtocol {
        match self {
            TransportLayer::Tcp(_) => TransportProtocol::Tcp,
            TransportLayer::Udp(_) => TransportProtocol::Udp,
            TransportLayer::Icmp(_) => TransportProtocol::Icmp,
        }
    }

    #[inline]
    pub fn src_port(&self) -> Option<u16> {
        match self {
            TransportLayer::Tcp(tcp) => Some(tcp.src_port),
            TransportLayer::Udp(udp) => Some(udp.src_port),
            TransportLayer::Icmp(_) => None,
        }
    }

    #[inline]
    pub fn dst_port(&self) -> Option<u16> {
        match self {
            TransportLayer::Tcp(tcp) => Some(tcp.dst_port),
            TransportLayer::Udp(udp) => Some(udp.dst_port),
            TransportLayer::Icmp(_) => None,
        }
    }
}

/// Application-level content, decoded with a verified signature.
#[derive(Debug, PartialEq, Clone)]
pub enum ApplicationLayer<'a> {
    Dns(DnsMessage<'a>),
    Http(HttpHeader<'a>),
    Tls(TlsHeader<'a>),
    ModbusReq(ModbusReqHeader<'a>),
    ModbusRsp(ModbusRspHeader<'a>),
}

impl ApplicationLayer<'_> {
    pub fn protocol(&self) -> ApplicationProtocol {
        match self {
            ApplicationLayer::Dns(_) => ApplicationProtocol::Dns,
            ApplicationLayer::Http(_) => ApplicationProtocol::Http,
            ApplicationLayer::Tls(_) => ApplicationProtocol::Tls,
            ApplicationLayer::ModbusReq(_) => ApplicationProtocol::ModbusReq,
            ApplicationLayer::ModbusRsp(_) => ApplicationProtocol::ModbusRsp,
        }
    }
}
