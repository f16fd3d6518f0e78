//! UDP header

use super::{udp_port_hint, NextProtocolHint};
use crate::cursor::ByteCursor;
use crate::error::{ParseError, Result};
use crate::protocol::TransportProtocol;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    /// Datagram length including the eight header bytes.
    pub length: u16,
    pub checksum: u16,
}

pub(crate) fn decode_udp<'a>(
    cursor: &mut ByteCursor<'a>,
) -> Result<(UdpHeader, NextProtocolHint)> {
    let map_eof = |e| ParseError::eof(TransportProtocol::Udp, e);
    let available = cursor.remaining();

    let src_port = cursor.take_u16_be().map_err(map_eof)?;
    let dst_port = cursor.take_u16_be().map_err(map_eof)?;
    let length = cursor.take_u16_be().map_err(map_eof)?;
    let checksum = cursor.take_u16_be().map_err(map_eof)?;

    let declared = usize::from(length);
    if declared < 8 || declared > available {
        return Err(ParseError::InvalidLength {
            protocol: TransportProtocol::Udp.into(),
            declared,
            available,
        });
    }
    // Clamp the window to the declared datagram end.
    cursor.limit(declared - 8).map_err(map_eof)?;

    let header = UdpHeader {
        src_port,
        dst_port,
        length,
        checksum,
    };

    let hint = if cursor.is_empty() {
        NextProtocolHint::Terminal
    } else {
        udp_port_hint(src_port, dst_port)
    };
    Ok((header, hint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ApplicationProtocol, ProtocolType};

    pub(crate) fn header_bytes(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&src_port.to_be_bytes());
        b.extend_from_slice(&dst_port.to_be_bytes());
        b.extend_from_slice(&((payload.len() + 8) as u16).to_be_bytes());
        b.extend_from_slice(&[0, 0]);
        b.extend_from_slice(payload);
        b
    }

    #[test]
    fn decodes_and_dispatches_dns() {
        let bytes = header_bytes(53124, 53, &[0u8; 12]);
        let mut cursor = ByteCursor::new(&bytes);
        let (header, hint) = decode_udp(&mut cursor).unwrap();
        assert_eq!(header.src_port, 53124);
        assert_eq!(header.dst_port, 53);
        assert_eq!(header.length, 20);
        assert_eq!(
            hint,
            NextProtocolHint::Next(ProtocolType::Application(ApplicationProtocol::Dns))
        );
    }

    #[test]
    fn undersized_length_field_is_rejected() {
        let mut bytes = header_bytes(1, 2, &[]);
        bytes[4] = 0;
        bytes[5] = 7;
        let mut cursor = ByteCursor::new(&bytes);
        assert!(matches!(
            decode_udp(&mut cursor),
            Err(ParseError::InvalidLength { declared: 7, .. })
        ));
    }

    #[test]
    fn length_beyond_buffer_is_rejected() {
        let bytes = header_bytes(1, 2, &[]); // length says 8
        let mut short = bytes.clone();
        short[5] = 32;
        let mut cursor = ByteCursor::new(&short);
        assert!(matches!(
            decode_udp(&mut cursor),
            Err(ParseError::InvalidLength { declared: 32, .. })
        ));
    }

    #[test]
    fn trailing_padding_is_clamped_off() {
        let mut bytes = header_bytes(1, 2, &[0xaa, 0xbb]);
        bytes.extend_from_slice(&[0xff; 6]); // link padding
        let mut cursor = ByteCursor::new(&bytes);
        decode_udp(&mut cursor).unwrap();
        assert_eq!(cursor.rest(), &[0xaa, 0xbb]);
    }
}
