//! ICMP header

use super::NextProtocolHint;
use crate::cursor::ByteCursor;
use crate::error::{ParseError, Result};
use crate::protocol::TransportProtocol;

/// ICMP is terminal: everything after the rest-of-header word stays in the
/// packet's payload slice.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct IcmpHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    /// Type-dependent second word (identifier/sequence, gateway, MTU, ...).
    pub rest_of_header: u32,
}

impl IcmpHeader {
    pub fn is_echo_request(&self) -> bool {
        self.icmp_type == 8 && self.code == 0
    }

    pub fn is_echo_reply(&self) -> bool {
        self.icmp_type == 0 && self.code == 0
    }
}

pub(crate) fn decode_icmp<'a>(
    cursor: &mut ByteCursor<'a>,
) -> Result<(IcmpHeader, NextProtocolHint)> {
    let map_eof = |e| ParseError::eof(TransportProtocol::Icmp, e);

    let icmp_type = cursor.take_u8().map_err(map_eof)?;
    let code = cursor.take_u8().map_err(map_eof)?;
    let checksum = cursor.take_u16_be().map_err(map_eof)?;
    let rest_of_header = cursor.take_u32_be().map_err(map_eof)?;

    let header = IcmpHeader {
        icmp_type,
        code,
        checksum,
        rest_of_header,
    };
    Ok((header, NextProtocolHint::Terminal))
}
