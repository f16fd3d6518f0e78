//! Packet decode pipeline
//!
//! Drives the per-protocol decoders over one buffer: dispatch on the
//! current protocol tag, append the decoded layer, follow the hint. The
//! dispatch is a closed match so adding a protocol variant without wiring
//! its decoder fails to compile.

use crate::cursor::ByteCursor;
use crate::decoders::{self, NextProtocolHint};
use crate::error::Result;
use crate::layer::{ApplicationLayer, LinkLayer, NetworkLayer, TransportLayer};
use crate::packet::{DecodeOptions, Layer, Packet};
use crate::protocol::{
    ApplicationProtocol, LinkProtocol, NetworkProtocol, ProtocolType, TransportProtocol,
};
use crate::sniff::sniff_application;

/// Decode `buffer` starting at `link`.
///
/// A structural failure (truncated or malformed header) aborts the decode
/// and returns the error; an *unrecognized* payload is routine and yields a
/// partial, well-formed packet with the tail preserved as opaque payload.
pub fn decode<'a>(
    buffer: &'a [u8],
    link: LinkProtocol,
    options: &DecodeOptions,
) -> Result<Packet<'a>> {
    let mut cursor = ByteCursor::new(buffer);
    let mut layers: Vec<Layer<'a>> = Vec::with_capacity(4);
    let mut current = ProtocolType::Link(link);

    loop {
        let hint = decode_layer(&mut cursor, current, options, &mut layers)?;

        if options.stop == Some(current) {
            break;
        }
        match hint {
            NextProtocolHint::Next(next) => {
                if cursor.is_empty() {
                    break;
                }
                debug_assert!(
                    next.stack_rank() >= current.stack_rank(),
                    "dispatch must never descend the stack"
                );
                current = next;
            }
            NextProtocolHint::Terminal | NextProtocolHint::Unknown => break,
        }
    }

    let payload = cursor.rest();
    let decoded_app = layers
        .iter()
        .any(|l| matches!(l, Layer::Application(_)));
    let app_hint = if decoded_app || payload.is_empty() {
        None
    } else {
        sniff_application(payload)
    };

    Ok(Packet {
        layers,
        payload,
        app_hint,
    })
}

fn decode_layer<'a>(
    cursor: &mut ByteCursor<'a>,
    current: ProtocolType,
    options: &DecodeOptions,
    layers: &mut Vec<Layer<'a>>,
) -> Result<NextProtocolHint> {
    let hint = match current {
        ProtocolType::Link(LinkProtocol::Ethernet) => {
            let (header, hint) = decoders::decode_ethernet(cursor)?;
            layers.push(Layer::Link(LinkLayer::Ethernet(header)));
            hint
        }
        ProtocolType::Link(LinkProtocol::Vlan) => {
            let (header, hint) = decoders::decode_vlan(cursor)?;
            layers.push(Layer::Link(LinkLayer::Vlan(header)));
            hint
        }
        ProtocolType::Network(NetworkProtocol::Ipv4) => {
            let (header, hint) = decoders::decode_ipv4(cursor, options.verify_checksums)?;
            layers.push(Layer::Network(NetworkLayer::Ipv4(header)));
            hint
        }
        ProtocolType::Network(NetworkProtocol::Ipv6) => {
            let (header, hint) = decoders::decode_ipv6(cursor)?;
            layers.push(Layer::Network(NetworkLayer::Ipv6(header)));
            hint
        }
        ProtocolType::Network(NetworkProtocol::Arp) => {
            let (header, hint) = decoders::decode_arp(cursor)?;
            layers.push(Layer::Network(NetworkLayer::Arp(header)));
            hint
        }
        ProtocolType::Transport(TransportProtocol::Tcp) => {
            let (header, hint) = decoders::decode_tcp(cursor)?;
            layers.push(Layer::Transport(TransportLayer::Tcp(header)));
            hint
        }
        ProtocolType::Transport(TransportProtocol::Udp) => {
            let (header, hint) = decoders::decode_udp(cursor)?;
            layers.push(Layer::Transport(TransportLayer::Udp(header)));
            hint
        }
        ProtocolType::Transport(TransportProtocol::Icmp) => {
            let (header, hint) = decoders::decode_icmp(cursor)?;
            layers.push(Layer::Transport(TransportLayer::Icmp(header)));
            hint
        }
        ProtocolType::Application(ApplicationProtocol::Dns) => {
            let (message, hint) = decoders::decode_dns(cursor)?;
            layers.push(Layer::Application(ApplicationLayer::Dns(message)));
            hint
        }
        ProtocolType::Application(ApplicationProtocol::Http) => {
            let (header, hint) = decoders::decode_http(cursor)?;
            layers.push(Layer::Application(ApplicationLayer::Http(header)));
            hint
        }
        ProtocolType::Application(ApplicationProtocol::Tls) => {
            let (header, hint) = decoders::decode_tls(cursor)?;
            layers.push(Layer::Application(ApplicationLayer::Tls(header)));
            hint
        }
        ProtocolType::Application(ApplicationProtocol::ModbusReq) => {
            let (header, hint) = decoders::decode_modbus_req(cursor)?;
            layers.push(Layer::Application(ApplicationLayer::ModbusReq(header)));
            hint
        }
        ProtocolType::Application(ApplicationProtocol::ModbusRsp) => {
            let (header, hint) = decoders::decode_modbus_rsp(cursor)?;
            layers.push(Layer::Application(ApplicationLayer::ModbusRsp(header)));
            hint
        }
    };
    Ok(hint)
}
