//! Per-protocol header decoders
//!
//! One module per protocol. Each decoder reads exactly its own header from
//! the shared [`ByteCursor`](crate::ByteCursor), validates it, and reports
//! where the pipeline should go next via [`NextProtocolHint`].

mod arp;
mod dns;
mod ethernet;
mod http;
mod icmp;
mod ipv4;
mod ipv6;
mod modbus;
mod tcp;
mod tls;
mod udp;
mod vlan;

pub use arp::{ArpHeader, ArpOperation};
pub use dns::{DnsHeader, DnsMessage, DnsQuestion, DnsRecord};
pub use ethernet::EthernetHeader;
pub use http::{HttpHeader, HttpRequest, HttpResponse};
pub use icmp::IcmpHeader;
pub use ipv4::Ipv4Header;
pub use ipv6::Ipv6Header;
pub use modbus::{
    MbapHeader, ModbusReqData, ModbusReqHeader, ModbusRspData, ModbusRspHeader,
};
pub use tcp::TcpHeader;
pub use tls::{ClientHello, TlsHeader};
pub use udp::UdpHeader;
pub use vlan::VlanHeader;

pub(crate) use arp::decode_arp;
pub(crate) use dns::decode_dns;
pub(crate) use ethernet::decode_ethernet;
pub(crate) use http::decode_http;
pub(crate) use icmp::decode_icmp;
pub(crate) use ipv4::decode_ipv4;
pub(crate) use ipv6::decode_ipv6;
pub(crate) use modbus::{decode_modbus_req, decode_modbus_rsp};
pub(crate) use tcp::decode_tcp;
pub(crate) use tls::decode_tls;
pub(crate) use udp::decode_udp;
pub(crate) use vlan::decode_vlan;

use crate::protocol::{
    ApplicationProtocol, LinkProtocol, NetworkProtocol, ProtocolType, TransportProtocol,
};

/// Where decoding goes after a layer has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextProtocolHint {
    /// Dispatch to a concrete next protocol.
    Next(ProtocolType),
    /// No more layers follow (the remainder, if any, is raw payload owned by
    /// this layer's semantics).
    Terminal,
    /// Payload present but its type is not recognized. Not an error: the
    /// pipeline stops and keeps the tail as an opaque payload.
    Unknown,
}

/// EtherType dispatch shared by Ethernet and VLAN tags.
pub(crate) fn ethertype_hint(ethertype: u16) -> NextProtocolHint {
    match ethertype {
        0x0800 => NextProtocolHint::Next(NetworkProtocol::Ipv4.into()),
        0x0806 => NextProtocolHint::Next(NetworkProtocol::Arp.into()),
        0x8100 => NextProtocolHint::Next(LinkProtocol::Vlan.into()),
        0x86DD => NextProtocolHint::Next(NetworkProtocol::Ipv6.into()),
        _ => NextProtocolHint::Unknown,
    }
}

/// IP protocol number dispatch shared by IPv4 and IPv6.
pub(crate) fn ip_protocol_hint(protocol: u8) -> NextProtocolHint {
    match protocol {
        0x01 => NextProtocolHint::Next(TransportProtocol::Icmp.into()),
        0x06 => NextProtocolHint::Next(TransportProtocol::Tcp.into()),
        0x11 => NextProtocolHint::Next(TransportProtocol::Udp.into()),
        _ => NextProtocolHint::Unknown,
    }
}

/// TCP port dispatch. The registered side of the connection decides the
/// protocol; for Modbus the side on port 502 tells request from response.
pub(crate) fn tcp_port_hint(src_port: u16, dst_port: u16) -> NextProtocolHint {
    match src_port {
        80 => NextProtocolHint::Next(ApplicationProtocol::Http.into()),
        443 => NextProtocolHint::Next(ApplicationProtocol::Tls.into()),
        502 => NextProtocolHint::Next(ApplicationProtocol::ModbusRsp.into()),
        _ => match dst_port {
            80 => NextProtocolHint::Next(ApplicationProtocol::Http.into()),
            443 => NextProtocolHint::Next(ApplicationProtocol::Tls.into()),
            502 => NextProtocolHint::Next(ApplicationProtocol::ModbusReq.into()),
            _ => NextProtocolHint::Unknown,
        },
    }
}

/// UDP port dispatch.
pub(crate) fn udp_port_hint(src_port: u16, dst_port: u16) -> NextProtocolHint {
    if src_port == 53 || dst_port == 53 {
        NextProtocolHint::Next(ApplicationProtocol::Dns.into())
    } else {
        NextProtocolHint::Unknown
    }
}
