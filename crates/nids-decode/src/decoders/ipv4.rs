//! IPv4 header

use std::net::Ipv4Addr;

use super::{ip_protocol_hint, NextProtocolHint};
use crate::cursor::ByteCursor;
use crate::error::{ParseError, Result};
use crate::protocol::NetworkProtocol;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Ipv4Header<'a> {
    pub version: u8,
    /// Header length in 32-bit words (IHL).
    pub header_length: u8,
    pub diff_service: u8,
    pub ecn: u8,
    pub total_length: u16,
    pub id: u16,
    pub flags: u8,
    pub fragment_offset: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub options: Option<&'a [u8]>,
}

/// Ones'-complement sum over the header, skipping the stored checksum word.
fn header_checksum(header: &[u8]) -> u16 {
    let mut sum = 0u32;
    for (i, chunk) in header.chunks_exact(2).enumerate() {
        if i == 5 {
            continue; // the checksum field itself
        }
        sum += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }
    while sum > 0xffff {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// The IHL and `total_length` fields are the source of truth for where the
/// payload starts and ends; both are cross-checked against the bytes
/// actually available before any sub-field is trusted, and the cursor window
/// is clamped to `total_length` so link-layer padding never reaches the
/// transport decoders.
pub(crate) fn decode_ipv4<'a>(
    cursor: &mut ByteCursor<'a>,
    verify_checksum: bool,
) -> Result<(Ipv4Header<'a>, NextProtocolHint)> {
    let map_eof = |e| ParseError::eof(NetworkProtocol::Ipv4, e);
    let start = cursor.position();
    let available = cursor.remaining();
    let raw = cursor.rest();

    let first = cursor.take_u8().map_err(map_eof)?;
    let version = first >> 4;
    let header_length = first & 0x0f;
    if version != 4 {
        return Err(ParseError::UnsupportedVersion {
            protocol: NetworkProtocol::Ipv4.into(),
            found: version,
        });
    }
    if header_length < 5 {
        return Err(ParseError::field(
            NetworkProtocol::Ipv4,
            "header_length",
            start,
        ));
    }
    let header_len = usize::from(header_length) * 4;
    if header_len > available {
        return Err(ParseError::InvalidLength {
            protocol: NetworkProtocol::Ipv4.into(),
            declared: header_len,
            available,
        });
    }

    let tos = cursor.take_u8().map_err(map_eof)?;
    let total_length = cursor.take_u16_be().map_err(map_eof)?;
    let id = cursor.take_u16_be().map_err(map_eof)?;
    let frag = cursor.take_u16_be().map_err(map_eof)?;
    let ttl = cursor.take_u8().map_err(map_eof)?;
    let protocol = cursor.take_u8().map_err(map_eof)?;
    let checksum = cursor.take_u16_be().map_err(map_eof)?;
    let src = cursor.take(4).map_err(map_eof)?;
    let dst = cursor.take(4).map_err(map_eof)?;
    let options = if header_len > 20 {
        Some(cursor.take(header_len - 20).map_err(map_eof)?)
    } else {
        None
    };

    let declared = usize::from(total_length);
    if declared < header_len || declared > available {
        return Err(ParseError::InvalidLength {
            protocol: NetworkProtocol::Ipv4.into(),
            declared,
            available,
        });
    }

    if verify_checksum {
        // In bounds: header_len bytes were consumed from `raw` above.
        let expected = header_checksum(&raw[..header_len]);
        if expected != checksum {
            return Err(ParseError::InvalidChecksum {
                protocol: NetworkProtocol::Ipv4.into(),
                expected,
                found: checksum,
            });
        }
    }

    // Clamp the window to the declared datagram end.
    let payload_len = declared - header_len;
    cursor.limit(payload_len).map_err(map_eof)?;

    let header = Ipv4Header {
        version,
        header_length,
        diff_service: tos >> 2,
        ecn: tos & 0x03,
        total_length,
        id,
        flags: (frag >> 13) as u8,
        fragment_offset: frag & 0x1fff,
        ttl,
        protocol,
        checksum,
        src_ip: Ipv4Addr::new(src[0], src[1], src[2], src[3]),
        dst_ip: Ipv4Addr::new(dst[0], dst[1], dst[2], dst[3]),
        options,
    };

    let hint = if payload_len == 0 {
        NextProtocolHint::Terminal
    } else {
        ip_protocol_hint(protocol)
    };
    Ok((header, hint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ProtocolType, TransportProtocol};

    /// 20-byte header, TCP payload of `payload_len` bytes, valid checksum.
    pub(crate) fn header_bytes(payload_len: usize) -> Vec<u8> {
        let total = 20 + payload_len as u16;
        let mut b = vec![
            0x45, 0x00, // version/ihl, tos
            (total >> 8) as u8, total as u8, // total length
            0x1a, 0x2b, // id
            0x40, 0x00, // DF, no fragment offset
            0x40, 0x06, // ttl, protocol tcp
            0x00, 0x00, // checksum placeholder
            192, 168, 0, 1, // src
            10, 0, 0, 1, // dst
        ];
        let sum = header_checksum(&b);
        b[10] = (sum >> 8) as u8;
        b[11] = sum as u8;
        b.extend(std::iter::repeat(0u8).take(payload_len));
        b
    }

    #[test]
    fn decodes_valid_header() {
        let bytes = header_bytes(8);
        let mut cursor = ByteCursor::new(&bytes);
        let (header, hint) = decode_ipv4(&mut cursor, true).unwrap();
        assert_eq!(header.version, 4);
        assert_eq!(header.header_length, 5);
        assert_eq!(header.ttl, 64);
        assert_eq!(header.protocol, 6);
        assert_eq!(header.src_ip, Ipv4Addr::new(192, 168, 0, 1));
        assert_eq!(header.dst_ip, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(
            hint,
            NextProtocolHint::Next(ProtocolType::Transport(TransportProtocol::Tcp))
        );
        assert_eq!(cursor.remaining(), 8);
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let mut bytes = header_bytes(8);
        bytes[10] ^= 0xff;
        let mut cursor = ByteCursor::new(&bytes);
        let err = decode_ipv4(&mut cursor, true).unwrap_err();
        assert!(matches!(err, ParseError::InvalidChecksum { .. }));
    }

    #[test]
    fn checksum_verification_can_be_disabled() {
        let mut bytes = header_bytes(0);
        bytes[10] ^= 0xff;
        let mut cursor = ByteCursor::new(&bytes);
        assert!(decode_ipv4(&mut cursor, false).is_ok());
    }

    #[test]
    fn wrong_version_is_rejected() {
        let mut bytes = header_bytes(0);
        bytes[0] = 0x65;
        let mut cursor = ByteCursor::new(&bytes);
        let err = decode_ipv4(&mut cursor, true).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedVersion { found: 6, .. }));
    }

    #[test]
    fn total_length_beyond_buffer_is_rejected() {
        let mut bytes = header_bytes(0);
        bytes[3] = 0xff; // declare 255 bytes in a 20-byte buffer
        let sum = header_checksum(&bytes[..20]);
        bytes[10] = (sum >> 8) as u8;
        bytes[11] = sum as u8;
        let mut cursor = ByteCursor::new(&bytes);
        let err = decode_ipv4(&mut cursor, true).unwrap_err();
        assert!(matches!(err, ParseError::InvalidLength { .. }));
    }

    #[test]
    fn trailing_padding_is_clamped_off() {
        let mut bytes = header_bytes(2);
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]); // ethernet padding
        let mut cursor = ByteCursor::new(&bytes);
        let (_, _) = decode_ipv4(&mut cursor, true).unwrap();
        assert_eq!(cursor.remaining(), 2);
    }

    #[test]
    fn truncated_header_fails_with_eof() {
        let bytes = &header_bytes(0)[..10];
        let mut cursor = ByteCursor::new(bytes);
        let err = decode_ipv4(&mut cursor, true).unwrap_err();
        assert!(matches!(err, ParseError::InvalidLength { .. } | ParseError::UnexpectedEof { .. }));
    }
}
