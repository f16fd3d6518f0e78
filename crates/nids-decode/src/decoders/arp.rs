//! ARP (IPv4 over Ethernet)

use std::net::Ipv4Addr;

use super::NextProtocolHint;
use crate::cursor::ByteCursor;
use crate::error::{ParseError, Result};
use crate::mac::MacAddress;
use crate::protocol::NetworkProtocol;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArpOperation {
    Request,
    Reply,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ArpHeader {
    pub hardware_type: u16,
    pub protocol_type: u16,
    pub operation: ArpOperation,
    pub sender_mac: MacAddress,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddress,
    pub target_ip: Ipv4Addr,
}

fn mac(bytes: &[u8]) -> MacAddress {
    MacAddress([bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]])
}

/// Only Ethernet/IPv4 ARP bodies are recognized; the address-length fields
/// are the source of truth for the body layout and are cross-checked before
/// any address is read.
pub(crate) fn decode_arp<'a>(
    cursor: &mut ByteCursor<'a>,
) -> Result<(ArpHeader, NextProtocolHint)> {
    let map_eof = |e| ParseError::eof(NetworkProtocol::Arp, e);
    let start = cursor.position();

    let hardware_type = cursor.take_u16_be().map_err(map_eof)?;
    let protocol_type = cursor.take_u16_be().map_err(map_eof)?;
    let hardware_size = cursor.take_u8().map_err(map_eof)?;
    let protocol_size = cursor.take_u8().map_err(map_eof)?;
    let opcode = cursor.take_u16_be().map_err(map_eof)?;

    if hardware_type != 1 {
        return Err(ParseError::field(
            NetworkProtocol::Arp,
            "hardware_type",
            start,
        ));
    }
    if protocol_type != 0x0800 {
        return Err(ParseError::field(
            NetworkProtocol::Arp,
            "protocol_type",
            start + 2,
        ));
    }
    if hardware_size != 6 {
        return Err(ParseError::field(
            NetworkProtocol::Arp,
            "hardware_size",
            start + 4,
        ));
    }
    if protocol_size != 4 {
        return Err(ParseError::field(
            NetworkProtocol::Arp,
            "protocol_size",
            start + 5,
        ));
    }
    let operation = match opcode {
        1 => ArpOperation::Request,
        2 => ArpOperation::Reply,
        _ => {
            return Err(ParseError::field(NetworkProtocol::Arp, "opcode", start + 6));
        }
    };

    let sender_mac = mac(cursor.take(6).map_err(map_eof)?);
    let sender = cursor.take(4).map_err(map_eof)?;
    let target_mac = mac(cursor.take(6).map_err(map_eof)?);
    let target = cursor.take(4).map_err(map_eof)?;

    let header = ArpHeader {
        hardware_type,
        protocol_type,
        operation,
        sender_mac,
        sender_ip: Ipv4Addr::new(sender[0], sender[1], sender[2], sender[3]),
        target_mac,
        target_ip: Ipv4Addr::new(target[0], target[1], target[2], target[3]),
    };
    Ok((header, NextProtocolHint::Terminal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_bytes() -> Vec<u8> {
        let mut b = vec![
            0x00, 0x01, // hardware: ethernet
            0x08, 0x00, // protocol: ipv4
            0x06, 0x04, // sizes
            0x00, 0x01, // request
        ];
        b.extend_from_slice(&[0x00, 0x1c, 0x42, 0x00, 0x00, 0x01]);
        b.extend_from_slice(&[192, 168, 0, 1]);
        b.extend_from_slice(&[0x00; 6]);
        b.extend_from_slice(&[192, 168, 0, 2]);
        b
    }

    #[test]
    fn decodes_request() {
        let bytes = request_bytes();
        let mut cursor = ByteCursor::new(&bytes);
        let (header, hint) = decode_arp(&mut cursor).unwrap();
        assert_eq!(header.operation, ArpOperation::Request);
        assert_eq!(header.sender_ip, Ipv4Addr::new(192, 168, 0, 1));
        assert_eq!(header.target_ip, Ipv4Addr::new(192, 168, 0, 2));
        assert_eq!(hint, NextProtocolHint::Terminal);
    }

    #[test]
    fn rejects_wrong_sizes() {
        let mut bytes = request_bytes();
        bytes[4] = 8; // hardware_size
        let mut cursor = ByteCursor::new(&bytes);
        let err = decode_arp(&mut cursor).unwrap_err();
        assert!(matches!(err, ParseError::MalformedField { ref field, .. } if field == "hardware_size"));
    }

    #[test]
    fn truncated_body_fails_with_eof() {
        let bytes = &request_bytes()[..20];
        let mut cursor = ByteCursor::new(bytes);
        assert!(matches!(
            decode_arp(&mut cursor),
            Err(ParseError::UnexpectedEof { .. })
        ));
    }
}
