//! TCP header

use super::{tcp_port_hint, NextProtocolHint};
use crate::cursor::ByteCursor;
use crate::error::{ParseError, Result};
use crate::protocol::TransportProtocol;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct TcpHeader<'a> {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
    pub ack: u32,
    /// Header length in 32-bit words.
    pub data_offset: u8,
    pub reserved: u8,
    /// Nine flag bits (NS..FIN).
    pub flags: u16,
    pub window_size: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
    pub options: Option<&'a [u8]>,
}

impl TcpHeader<'_> {
    pub fn fin(&self) -> bool {
        self.flags & 0x001 != 0
    }
    pub fn syn(&self) -> bool {
        self.flags & 0x002 != 0
    }
    pub fn rst(&self) -> bool {
        self.flags & 0x004 != 0
    }
    pub fn psh(&self) -> bool {
        self.flags & 0x008 != 0
    }
    pub fn ack_flag(&self) -> bool {
        self.flags & 0x010 != 0
    }
    pub fn urg(&self) -> bool {
        self.flags & 0x020 != 0
    }
}

pub(crate) fn decode_tcp<'a>(
    cursor: &mut ByteCursor<'a>,
) -> Result<(TcpHeader<'a>, NextProtocolHint)> {
    let map_eof = |e| ParseError::eof(TransportProtocol::Tcp, e);
    let start = cursor.position();
    let available = cursor.remaining();

    let src_port = cursor.take_u16_be().map_err(map_eof)?;
    let dst_port = cursor.take_u16_be().map_err(map_eof)?;
    let seq = cursor.take_u32_be().map_err(map_eof)?;
    let ack = cursor.take_u32_be().map_err(map_eof)?;
    let b12 = cursor.take_u8().map_err(map_eof)?;
    let b13 = cursor.take_u8().map_err(map_eof)?;
    let window_size = cursor.take_u16_be().map_err(map_eof)?;
    let checksum = cursor.take_u16_be().map_err(map_eof)?;
    let urgent_pointer = cursor.take_u16_be().map_err(map_eof)?;

    let data_offset = b12 >> 4;
    if data_offset < 5 {
        return Err(ParseError::field(
            TransportProtocol::Tcp,
            "data_offset",
            start + 12,
        ));
    }
    let header_len = usize::from(data_offset) * 4;
    if header_len > available {
        return Err(ParseError::InvalidLength {
            protocol: TransportProtocol::Tcp.into(),
            declared: header_len,
            available,
        });
    }
    let options = if header_len > 20 {
        Some(cursor.take(header_len - 20).map_err(map_eof)?)
    } else {
        None
    };

    let header = TcpHeader {
        src_port,
        dst_port,
        seq,
        ack,
        data_offset,
        reserved: (b12 >> 1) & 0x07,
        flags: (u16::from(b12 & 0x01) << 8) | u16::from(b13),
        window_size,
        checksum,
        urgent_pointer,
        options,
    };

    let hint = if cursor.is_empty() {
        NextProtocolHint::Terminal
    } else {
        tcp_port_hint(src_port, dst_port)
    };
    Ok((header, hint))
}
