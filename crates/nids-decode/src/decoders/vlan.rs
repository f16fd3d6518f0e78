//! IEEE 802.1Q VLAN tag

use super::{ethertype_hint, NextProtocolHint};
use crate::cursor::ByteCursor;
use crate::error::{ParseError, Result};
use crate::protocol::LinkProtocol;

/// One 802.1Q tag. Stacked tags (QinQ) decode as successive VLAN layers.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct VlanHeader {
    /// Priority code point.
    pub pcp: u8,
    /// Drop eligible indicator.
    pub dei: bool,
    /// VLAN identifier (12 bits).
    pub vid: u16,
    /// EtherType of the encapsulated frame.
    pub ethertype: u16,
}

pub(crate) fn decode_vlan<'a>(
    cursor: &mut ByteCursor<'a>,
) -> Result<(VlanHeader, NextProtocolHint)> {
    let map_eof = |e| ParseError::eof(LinkProtocol::Vlan, e);

    let tci = cursor.take_u16_be().map_err(map_eof)?;
    let ethertype = cursor.take_u16_be().map_err(map_eof)?;

    let header = VlanHeader {
        pcp: (tci >> 13) as u8,
        dei: tci & 0x1000 != 0,
        vid: tci & 0x0fff,
        ethertype,
    };
    Ok((header, ethertype_hint(ethertype)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{NetworkProtocol, ProtocolType};

    #[test]
    fn decodes_tag_fields() {
        // PCP 5, DEI set, VID 100, inner IPv4
        let bytes = [0xb0, 0x64, 0x08, 0x00];
        let mut cursor = ByteCursor::new(&bytes);
        let (header, hint) = decode_vlan(&mut cursor).unwrap();
        assert_eq!(header.pcp, 5);
        assert!(header.dei);
        assert_eq!(header.vid, 100);
        assert_eq!(
            hint,
            NextProtocolHint::Next(ProtocolType::Network(NetworkProtocol::Ipv4))
        );
    }

    #[test]
    fn stacked_tag_dispatches_to_vlan_again() {
        let bytes = [0x00, 0x0a, 0x81, 0x00];
        let mut cursor = ByteCursor::new(&bytes);
        let (_, hint) = decode_vlan(&mut cursor).unwrap();
        assert_eq!(
            hint,
            NextProtocolHint::Next(ProtocolType::Link(LinkProtocol::Vlan))
        );
    }

    #[test]
    fn truncated_tag_fails() {
        let bytes = [0x00, 0x0a, 0x08];
        let mut cursor = ByteCursor::new(&bytes);
        assert!(matches!(
            decode_vlan(&mut cursor),
            Err(ParseError::UnexpectedEof { .. })
        ));
    }
}
