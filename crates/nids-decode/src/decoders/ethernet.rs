//! Ethernet II frame header

use super::{ethertype_hint, NextProtocolHint};
use crate::cursor::ByteCursor;
use crate::error::{ParseError, Result};
use crate::mac::MacAddress;
use crate::protocol::LinkProtocol;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct EthernetHeader {
    pub dst_mac: MacAddress,
    pub src_mac: MacAddress,
    pub ethertype: u16,
}

pub(crate) fn decode_ethernet<'a>(
    cursor: &mut ByteCursor<'a>,
) -> Result<(EthernetHeader, NextProtocolHint)> {
    let map_eof = |e| ParseError::eof(LinkProtocol::Ethernet, e);

    let dst = cursor.take(6).map_err(map_eof)?;
    let src = cursor.take(6).map_err(map_eof)?;
    let ethertype = cursor.take_u16_be().map_err(map_eof)?;

    let header = EthernetHeader {
        dst_mac: MacAddress([dst[0], dst[1], dst[2], dst[3], dst[4], dst[5]]),
        src_mac: MacAddress([src[0], src[1], src[2], src[3], src[4], src[5]]),
        ethertype,
    };
    Ok((header, ethertype_hint(ethertype)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{NetworkProtocol, ProtocolType};

    #[test]
    fn decodes_ipv4_frame_header() {
        let bytes = [
            0x00, 0x1c, 0x42, 0x00, 0x00, 0x01, // dst
            0x00, 0x1c, 0x42, 0x00, 0x00, 0x02, // src
            0x08, 0x00, // IPv4
        ];
        let mut cursor = ByteCursor::new(&bytes);
        let (header, hint) = decode_ethernet(&mut cursor).unwrap();
        assert_eq!(header.dst_mac.to_string(), "00:1c:42:00:00:01");
        assert_eq!(header.src_mac.to_string(), "00:1c:42:00:00:02");
        assert_eq!(header.ethertype, 0x0800);
        assert_eq!(
            hint,
            NextProtocolHint::Next(ProtocolType::Network(NetworkProtocol::Ipv4))
        );
        assert!(cursor.is_empty());
    }

    #[test]
    fn short_frame_fails_with_eof() {
        let bytes = [0u8; 13];
        let mut cursor = ByteCursor::new(&bytes);
        let err = decode_ethernet(&mut cursor).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { offset: 12, .. }));
    }

    #[test]
    fn unknown_ethertype_is_not_an_error() {
        let mut bytes = [0u8; 14];
        bytes[12] = 0x88;
        bytes[13] = 0xb5;
        let mut cursor = ByteCursor::new(&bytes);
        let (_, hint) = decode_ethernet(&mut cursor).unwrap();
        assert_eq!(hint, NextProtocolHint::Unknown);
    }
}
