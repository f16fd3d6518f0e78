//! Full-stack decode tests over hand-built byte templates.

use nids_decode::{
    decode, ApplicationLayer, ApplicationNaiveProtocol, ApplicationProtocol, DecodeOptions, Layer,
    LinkLayer, LinkProtocol, NetworkLayer, NetworkProtocol, ParseError, ProtocolType,
    TransportLayer, TransportProtocol,
};
use std::net::{IpAddr, Ipv4Addr};

fn ipv4_checksum(header: &[u8]) -> u16 {
    let mut sum = 0u32;
    for (i, chunk) in header.chunks_exact(2).enumerate() {
        if i == 5 {
            continue;
        }
        sum += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }
    while sum > 0xffff {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

fn ethernet(ethertype: u16) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(&[0x00, 0x1c, 0x42, 0x00, 0x00, 0x01]);
    b.extend_from_slice(&[0x00, 0x1c, 0x42, 0x00, 0x00, 0x02]);
    b.extend_from_slice(&ethertype.to_be_bytes());
    b
}

fn ipv4(protocol: u8, payload_len: usize) -> Vec<u8> {
    let total = (20 + payload_len) as u16;
    let mut b = vec![
        0x45, 0x00,
        (total >> 8) as u8, total as u8,
        0x1a, 0x2b,
        0x40, 0x00,
        0x40, protocol,
        0x00, 0x00,
        192, 168, 0, 1,
        10, 0, 0, 1,
    ];
    let sum = ipv4_checksum(&b);
    b[10] = (sum >> 8) as u8;
    b[11] = sum as u8;
    b
}

fn tcp(src_port: u16, dst_port: u16) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(&src_port.to_be_bytes());
    b.extend_from_slice(&dst_port.to_be_bytes());
    b.extend_from_slice(&0x1000_0001u32.to_be_bytes());
    b.extend_from_slice(&0x2000_0002u32.to_be_bytes());
    b.push(0x50);
    b.push(0x18); // PSH|ACK
    b.extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);
    b
}

fn udp(src_port: u16, dst_port: u16, payload_len: usize) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(&src_port.to_be_bytes());
    b.extend_from_slice(&dst_port.to_be_bytes());
    b.extend_from_slice(&((payload_len + 8) as u16).to_be_bytes());
    b.extend_from_slice(&[0, 0]);
    b
}

fn eth_ipv4_tcp(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut b = ethernet(0x0800);
    b.extend(ipv4(6, 20 + payload.len()));
    b.extend(tcp(src_port, dst_port));
    b.extend_from_slice(payload);
    b
}

fn eth_ipv4_udp(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut b = ethernet(0x0800);
    b.extend(ipv4(17, 8 + payload.len()));
    b.extend(udp(src_port, dst_port, payload.len()));
    b.extend_from_slice(payload);
    b
}

fn dns_query() -> Vec<u8> {
    let mut b = vec![
        0x1a, 0x2b, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    b.extend_from_slice(b"\x03www\x07example\x03com\x00");
    b.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    b
}

fn modbus_read_coils() -> Vec<u8> {
    vec![
        0x01, 0x00, 0x00, 0x00, 0x00, 0x06, 0x01, 0x01, 0x00, 0x00, 0x00, 0x0a,
    ]
}

#[test]
fn ethernet_ipv4_tcp_round_trip() {
    let frame = eth_ipv4_tcp(12345, 9999, b"payload");
    let packet = decode(&frame, LinkProtocol::Ethernet, &DecodeOptions::default()).unwrap();

    let tags: Vec<ProtocolType> = packet.protocol_types().collect();
    assert_eq!(
        tags,
        vec![
            ProtocolType::Link(LinkProtocol::Ethernet),
            ProtocolType::Network(NetworkProtocol::Ipv4),
            ProtocolType::Transport(TransportProtocol::Tcp),
        ]
    );

    assert_eq!(packet.src_mac().unwrap().to_string(), "00:1c:42:00:00:02");
    assert_eq!(packet.dst_mac().unwrap().to_string(), "00:1c:42:00:00:01");
    assert_eq!(
        packet.src_ip(),
        Some(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 1)))
    );
    assert_eq!(packet.dst_ip(), Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
    assert_eq!(packet.src_port(), Some(12345));
    assert_eq!(packet.dst_port(), Some(9999));

    let Some(TransportLayer::Tcp(tcp)) = packet.transport() else {
        panic!("expected tcp layer");
    };
    assert_eq!(tcp.seq, 0x1000_0001);
    assert!(tcp.psh());
    assert!(tcp.ack_flag());

    assert_eq!(packet.payload, b"payload");
}

#[test]
fn unknown_transport_stops_gracefully() {
    let mut frame = ethernet(0x0800);
    frame.extend(ipv4(47, 4)); // GRE: not in the dispatch table
    frame.extend_from_slice(&[1, 2, 3, 4]);

    let packet = decode(&frame, LinkProtocol::Ethernet, &DecodeOptions::default()).unwrap();
    assert_eq!(packet.layers.len(), 2);
    assert!(packet.transport().is_none());
    assert_eq!(packet.payload, &[1, 2, 3, 4]);
}

#[test]
fn corrupted_checksum_aborts_before_transport() {
    let mut frame = eth_ipv4_tcp(1, 2, b"");
    frame[14 + 10] ^= 0x01; // flip a checksum bit
    let err = decode(&frame, LinkProtocol::Ethernet, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::InvalidChecksum { .. }));
}

#[test]
fn vlan_stacking_repeats_only_link_layers() {
    let mut frame = ethernet(0x8100);
    frame.extend_from_slice(&[0x00, 0x64, 0x81, 0x00]); // outer tag, inner vlan
    frame.extend_from_slice(&[0x00, 0xc8, 0x08, 0x00]); // inner tag, ipv4
    frame.extend(ipv4(6, 20));
    frame.extend(tcp(1, 2));

    let packet = decode(&frame, LinkProtocol::Ethernet, &DecodeOptions::default()).unwrap();
    let tags: Vec<ProtocolType> = packet.protocol_types().collect();
    assert_eq!(
        tags,
        vec![
            ProtocolType::Link(LinkProtocol::Ethernet),
            ProtocolType::Link(LinkProtocol::Vlan),
            ProtocolType::Link(LinkProtocol::Vlan),
            ProtocolType::Network(NetworkProtocol::Ipv4),
            ProtocolType::Transport(TransportProtocol::Tcp),
        ]
    );

    // ranks never decrease
    let ranks: Vec<u8> = tags.iter().map(|t| t.stack_rank()).collect();
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]));

    let vlans: Vec<u16> = packet
        .layers
        .iter()
        .filter_map(|l| match l {
            Layer::Link(LinkLayer::Vlan(v)) => Some(v.vid),
            _ => None,
        })
        .collect();
    assert_eq!(vlans, vec![100, 200]);
}

#[test]
fn udp_dns_end_to_end() {
    let frame = eth_ipv4_udp(53124, 53, &dns_query());
    let packet = decode(&frame, LinkProtocol::Ethernet, &DecodeOptions::default()).unwrap();

    let Some(ApplicationLayer::Dns(dns)) = packet.application() else {
        panic!("expected dns layer");
    };
    assert!(!dns.header.is_response());
    assert_eq!(dns.questions[0].qname, "www.example.com");
    assert_eq!(
        packet.app_protocol(),
        Some(ApplicationNaiveProtocol::Dns)
    );
}

#[test]
fn tcp_modbus_request_end_to_end() {
    let frame = eth_ipv4_tcp(50000, 502, &modbus_read_coils());
    let packet = decode(&frame, LinkProtocol::Ethernet, &DecodeOptions::default()).unwrap();

    let Some(ApplicationLayer::ModbusReq(req)) = packet.application() else {
        panic!("expected modbus request layer");
    };
    assert_eq!(req.function_code, 1);
    assert_eq!(req.start_address(), Some(0));
    assert_eq!(req.end_address(), Some(9));
    assert!(packet.has_protocol(ProtocolType::Application(
        ApplicationProtocol::ModbusReq
    )));
}

#[test]
fn stop_option_halts_at_requested_layer() {
    let frame = eth_ipv4_tcp(50000, 502, &modbus_read_coils());
    let options = DecodeOptions {
        stop: Some(ProtocolType::Network(NetworkProtocol::Ipv4)),
        ..DecodeOptions::default()
    };
    let packet = decode(&frame, LinkProtocol::Ethernet, &options).unwrap();
    assert_eq!(packet.layers.len(), 2);
    assert!(matches!(
        packet.layers.last(),
        Some(Layer::Network(NetworkLayer::Ipv4(_)))
    ));
    assert!(!packet.payload.is_empty());
}

#[test]
fn unrecognized_port_payload_gets_a_heuristic_label() {
    let frame = eth_ipv4_tcp(50000, 8080, b"GET /health HTTP/1.1\r\n\r\n");
    let packet = decode(&frame, LinkProtocol::Ethernet, &DecodeOptions::default()).unwrap();
    assert!(packet.application().is_none());
    assert_eq!(packet.app_hint, Some(ApplicationNaiveProtocol::Http));
}

#[test]
fn every_truncation_fails_soft() {
    let frame = eth_ipv4_tcp(50000, 502, &modbus_read_coils());
    for len in 0..frame.len() {
        // Either a typed error or a shorter well-formed packet; never a
        // panic, never an out-of-bounds read.
        match decode(&frame[..len], LinkProtocol::Ethernet, &DecodeOptions::default()) {
            Ok(packet) => {
                let ranks: Vec<u8> =
                    packet.protocol_types().map(|t| t.stack_rank()).collect();
                assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
            }
            Err(_) => {}
        }
    }
}

#[test]
fn short_buffers_fail_with_eof() {
    for len in 0..14 {
        let frame = vec![0u8; len];
        let err =
            decode(&frame, LinkProtocol::Ethernet, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }
}

#[test]
fn tls_client_hello_end_to_end() {
    // Minimal ClientHello with no extensions.
    let mut hello = Vec::new();
    hello.extend_from_slice(&[0x03, 0x03]);
    hello.extend_from_slice(&[0u8; 32]);
    hello.push(0);
    hello.extend_from_slice(&[0x00, 0x02, 0x13, 0x01]);
    hello.extend_from_slice(&[0x01, 0x00]);
    let mut handshake = vec![0x01, 0x00, 0x00, hello.len() as u8];
    handshake.extend_from_slice(&hello);
    let mut record = vec![0x16, 0x03, 0x01, 0x00, handshake.len() as u8];
    record.extend_from_slice(&handshake);

    let frame = eth_ipv4_tcp(50000, 443, &record);
    let packet = decode(&frame, LinkProtocol::Ethernet, &DecodeOptions::default()).unwrap();
    let Some(ApplicationLayer::Tls(tls)) = packet.application() else {
        panic!("expected tls layer");
    };
    let hello = tls.client_hello.as_ref().expect("client hello");
    assert_eq!(hello.cipher_suites, vec![0x1301]);
}

#[test]
fn arp_request_decodes_terminal() {
    let mut frame = ethernet(0x0806);
    frame.extend_from_slice(&[0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01]);
    frame.extend_from_slice(&[0x00, 0x1c, 0x42, 0x00, 0x00, 0x02]);
    frame.extend_from_slice(&[192, 168, 0, 1]);
    frame.extend_from_slice(&[0x00; 6]);
    frame.extend_from_slice(&[192, 168, 0, 99]);

    let packet = decode(&frame, LinkProtocol::Ethernet, &DecodeOptions::default()).unwrap();
    assert_eq!(packet.layers.len(), 2);
    let Some(NetworkLayer::Arp(arp)) = packet.network() else {
        panic!("expected arp layer");
    };
    assert_eq!(arp.target_ip, Ipv4Addr::new(192, 168, 0, 99));
    assert!(packet.payload.is_empty());
}
