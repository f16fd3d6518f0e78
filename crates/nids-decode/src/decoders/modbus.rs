//! Modbus/TCP (MBAP header + function-code-dispatched PDU)
//!
//! The same port carries requests and responses; the pipeline picks the
//! request or response decoder by which side of the connection is port 502.

use super::NextProtocolHint;
use crate::cursor::ByteCursor;
use crate::error::{ParseError, Result};
use crate::protocol::ApplicationProtocol;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MbapHeader {
    pub transaction_id: u16,
    pub protocol_id: u16,
    /// Bytes following the length field (unit id + PDU).
    pub length: u16,
    pub unit_id: u8,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ModbusReqHeader<'a> {
    pub mbap: MbapHeader,
    pub function_code: u8,
    pub data: ModbusReqData<'a>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ModbusRspHeader<'a> {
    pub mbap: MbapHeader,
    pub function_code: u8,
    pub data: ModbusRspData<'a>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ModbusReqData<'a> {
    ReadCoils {
        start_address: u16,
        count: u16,
    },
    ReadDiscreteInputs {
        start_address: u16,
        count: u16,
    },
    ReadHoldingRegisters {
        start_address: u16,
        count: u16,
    },
    ReadInputRegisters {
        start_address: u16,
        count: u16,
    },
    WriteSingleCoil {
        output_address: u16,
        output_value: u16,
    },
    WriteSingleRegister {
        register_address: u16,
        register_value: u16,
    },
    ReadExceptionStatus,
    WriteMultipleCoils {
        start_address: u16,
        output_count: u16,
        values: &'a [u8],
    },
    WriteMultipleRegisters {
        start_address: u16,
        register_count: u16,
        values: Vec<u16>,
    },
    MaskWriteRegister {
        ref_address: u16,
        and_mask: u16,
        or_mask: u16,
    },
    ReadWriteMultipleRegisters {
        read_start_address: u16,
        read_count: u16,
        write_start_address: u16,
        write_count: u16,
        write_values: Vec<u16>,
    },
    ReadFifoQueue {
        pointer_address: u16,
    },
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ModbusRspData<'a> {
    ReadCoils {
        coil_status: &'a [u8],
    },
    ReadDiscreteInputs {
        input_status: &'a [u8],
    },
    ReadHoldingRegisters {
        values: Vec<u16>,
    },
    ReadInputRegisters {
        values: Vec<u16>,
    },
    WriteSingleCoil {
        output_address: u16,
        output_value: u16,
    },
    WriteSingleRegister {
        register_address: u16,
        register_value: u16,
    },
    ReadExceptionStatus {
        output_data: u8,
    },
    WriteMultipleCoils {
        start_address: u16,
        output_count: u16,
    },
    WriteMultipleRegisters {
        start_address: u16,
        register_count: u16,
    },
    MaskWriteRegister {
        ref_address: u16,
        and_mask: u16,
        or_mask: u16,
    },
    ReadFifoQueue {
        values: Vec<u16>,
    },
    /// Function code with the exception bit set.
    Exception {
        exception_code: u8,
    },
}

impl ModbusReqHeader<'_> {
    /// Start address touched by the request, when the function has one.
    pub fn start_address(&self) -> Option<u16> {
        use ModbusReqData::*;
        match &self.data {
            ReadCoils { start_address, .. }
            | ReadDiscreteInputs { start_address, .. }
            | ReadHoldingRegisters { start_address, .. }
            | ReadInputRegisters { start_address, .. }
            | WriteMultipleCoils { start_address, .. }
            | WriteMultipleRegisters { start_address, .. } => Some(*start_address),
            WriteSingleCoil { output_address, .. } => Some(*output_address),
            WriteSingleRegister {
                register_address, ..
            } => Some(*register_address),
            MaskWriteRegister { ref_address, .. } => Some(*ref_address),
            ReadWriteMultipleRegisters {
                read_start_address, ..
            } => Some(*read_start_address),
            ReadFifoQueue { pointer_address } => Some(*pointer_address),
            ReadExceptionStatus => None,
        }
    }

    /// Last address touched by the request, when derivable.
    pub fn end_address(&self) -> Option<u16> {
        use ModbusReqData::*;
        let span = |start: u16, count: u16| start.saturating_add(count.saturating_sub(1));
        match &self.data {
            ReadCoils {
                start_address,
                count,
            }
            | ReadDiscreteInputs {
                start_address,
                count,
            }
            | ReadHoldingRegisters {
                start_address,
                count,
            }
            | ReadInputRegisters {
                start_address,
                count,
            } => Some(span(*start_address, *count)),
            WriteMultipleCoils {
                start_address,
                output_count,
                ..
            } => Some(span(*start_address, *output_count)),
            WriteMultipleRegisters {
                start_address,
                register_count,
                ..
            } => Some(span(*start_address, *register_count)),
            _ => self.start_address(),
        }
    }
}

fn decode_mbap(cursor: &mut ByteCursor<'_>, side: ApplicationProtocol) -> Result<MbapHeader> {
    let map_eof = |e| ParseError::eof(side, e);
    let start = cursor.position();
    let available = cursor.remaining();

    let transaction_id = cursor.take_u16_be().map_err(map_eof)?;
    let protocol_id = cursor.take_u16_be().map_err(map_eof)?;
    let length = cursor.take_u16_be().map_err(map_eof)?;
    let unit_id = cursor.take_u8().map_err(map_eof)?;

    if protocol_id != 0 {
        return Err(ParseError::field(side, "protocol_id", start + 2));
    }
    let declared = usize::from(length);
    if declared < 2 || declared + 6 > available {
        return Err(ParseError::InvalidLength {
            protocol: side.into(),
            declared: declared + 6,
            available,
        });
    }
    // Clamp the window to the declared PDU end.
    cursor.limit(declared - 1).map_err(map_eof)?;

    Ok(MbapHeader {
        transaction_id,
        protocol_id,
        length,
        unit_id,
    })
}

fn take_registers(
    cursor: &mut ByteCursor<'_>,
    byte_count: u8,
    side: ApplicationProtocol,
) -> Result<Vec<u16>> {
    let map_eof = |e| ParseError::eof(side, e);
    if byte_count % 2 != 0 {
        return Err(ParseError::field(side, "byte_count", cursor.position()));
    }
    let mut values = Vec::with_capacity(usize::from(byte_count / 2));
    for _ in 0..byte_count / 2 {
        values.push(cursor.take_u16_be().map_err(map_eof)?);
    }
    Ok(values)
}

pub(crate) fn decode_modbus_req<'a>(
    cursor: &mut ByteCursor<'a>,
) -> Result<(ModbusReqHeader<'a>, NextProtocolHint)> {
    const SIDE: ApplicationProtocol = ApplicationProtocol::ModbusReq;
    let map_eof = |e| ParseError::eof(SIDE, e);

    let mbap = decode_mbap(cursor, SIDE)?;
    let fc_at = cursor.position();
    let function_code = cursor.take_u8().map_err(map_eof)?;

    let data = match function_code {
        0x01 => ModbusReqData::ReadCoils {
            start_address: cursor.take_u16_be().map_err(map_eof)?,
            count: cursor.take_u16_be().map_err(map_eof)?,
        },
        0x02 => ModbusReqData::ReadDiscreteInputs {
            start_address: cursor.take_u16_be().map_err(map_eof)?,
            count: cursor.take_u16_be().map_err(map_eof)?,
        },
        0x03 => ModbusReqData::ReadHoldingRegisters {
            start_address: cursor.take_u16_be().map_err(map_eof)?,
            count: cursor.take_u16_be().map_err(map_eof)?,
        },
        0x04 => ModbusReqData::ReadInputRegisters {
            start_address: cursor.take_u16_be().map_err(map_eof)?,
            count: cursor.take_u16_be().map_err(map_eof)?,
        },
        0x05 => ModbusReqData::WriteSingleCoil {
            output_address: cursor.take_u16_be().map_err(map_eof)?,
            output_value: cursor.take_u16_be().map_err(map_eof)?,
        },
        0x06 => ModbusReqData::WriteSingleRegister {
            register_address: cursor.take_u16_be().map_err(map_eof)?,
            register_value: cursor.take_u16_be().map_err(map_eof)?,
        },
        0x07 => ModbusReqData::ReadExceptionStatus,
        0x0f => {
            let start_address = cursor.take_u16_be().map_err(map_eof)?;
            let output_count = cursor.take_u16_be().map_err(map_eof)?;
            let byte_count = cursor.take_u8().map_err(map_eof)?;
            ModbusReqData::WriteMultipleCoils {
                start_address,
                output_count,
                values: cursor.take(usize::from(byte_count)).map_err(map_eof)?,
            }
        }
        0x10 => {
            let start_address = cursor.take_u16_be().map_err(map_eof)?;
            let register_count = cursor.take_u16_be().map_err(map_eof)?;
            let byte_count = cursor.take_u8().map_err(map_eof)?;
            ModbusReqData::WriteMultipleRegisters {
                start_address,
                register_count,
                values: take_registers(cursor, byte_count, SIDE)?,
            }
        }
        0x16 => ModbusReqData::MaskWriteRegister {
            ref_address: cursor.take_u16_be().map_err(map_eof)?,
            and_mask: cursor.take_u16_be().map_err(map_eof)?,
            or_mask: cursor.take_u16_be().map_err(map_eof)?,
        },
        0x17 => {
            let read_start_address = cursor.take_u16_be().map_err(map_eof)?;
            let read_count = cursor.take_u16_be().map_err(map_eof)?;
            let write_start_address = cursor.take_u16_be().map_err(map_eof)?;
            let write_count = cursor.take_u16_be().map_err(map_eof)?;
            let byte_count = cursor.take_u8().map_err(map_eof)?;
            ModbusReqData::ReadWriteMultipleRegisters {
                read_start_address,
                read_count,
                write_start_address,
                write_count,
                write_values: take_registers(cursor, byte_count, SIDE)?,
            }
        }
        0x18 => ModbusReqData::ReadFifoQueue {
            pointer_address: cursor.take_u16_be().map_err(map_eof)?,
        },
        _ => return Err(ParseError::field(SIDE, "function_code", fc_at)),
    };

    let header = ModbusReqHeader {
        mbap,
        function_code,
        data,
    };
    Ok((header, NextProtocolHint::Terminal))
}

pub(crate) fn decode_modbus_rsp<'a>(
    cursor: &mut ByteCursor<'a>,
) -> Result<(ModbusRspHeader<'a>, NextProtocolHint)> {
    const SIDE: ApplicationProtocol = ApplicationProtocol::ModbusRsp;
    let map_eof = |e| ParseError::eof(SIDE, e);

    let mbap = decode_mbap(cursor, SIDE)?;
    let fc_at = cursor.position();
    let function_code = cursor.take_u8().map_err(map_eof)?;

    if function_code & 0x80 != 0 {
        let data = ModbusRspData::Exception {
            exception_code: cursor.take_u8().map_err(map_eof)?,
        };
        let header = ModbusRspHeader {
            mbap,
            function_code,
            data,
        };
        return Ok((header, NextProtocolHint::Terminal));
    }

    let data = match function_code {
        0x01 => {
            let byte_count = cursor.take_u8().map_err(map_eof)?;
            ModbusRspData::ReadCoils {
                coil_status: cursor.take(usize::from(byte_count)).map_err(map_eof)?,
            }
        }
        0x02 => {
            let byte_count = cursor.take_u8().map_err(map_eof)?;
            ModbusRspData::ReadDiscreteInputs {
                input_status: cursor.take(usize::from(byte_count)).map_err(map_eof)?,
            }
        }
        0x03 => {
            let byte_count = cursor.take_u8().map_err(map_eof)?;
            ModbusRspData::ReadHoldingRegisters {
                values: take_registers(cursor, byte_count, SIDE)?,
            }
        }
        0x04 => {
            let byte_count = cursor.take_u8().map_err(map_eof)?;
            ModbusRspData::ReadInputRegisters {
                values: take_registers(cursor, byte_count, SIDE)?,
            }
        }
        0x05 => ModbusRspData::WriteSingleCoil {
            output_address: cursor.take_u16_be().map_err(map_eof)?,
            output_value: cursor.take_u16_be().map_err(map_eof)?,
        },
        0x06 => ModbusRspData::WriteSingleRegister {
            register_address: cursor.take_u16_be().map_err(map_eof)?,
            register_value: cursor.take_u16_be().map_err(map_eof)?,
        },
        0x07 => ModbusRspData::ReadExceptionStatus {
            output_data: cursor.take_u8().map_err(map_eof)?,
        },
        0x0f => ModbusRspData::WriteMultipleCoils {
            start_address: cursor.take_u16_be().map_err(map_eof)?,
            output_count: cursor.take_u16_be().map_err(map_eof)?,
        },
        0x10 => ModbusRspData::WriteMultipleRegisters {
            start_address: cursor.take_u16_be().map_err(map_eof)?,
            register_count: cursor.take_u16_be().map_err(map_eof)?,
        },
        0x16 => ModbusRspData::MaskWriteRegister {
            ref_address: cursor.take_u16_be().map_err(map_eof)?,
            and_mask: cursor.take_u16_be().map_err(map_eof)?,
            or_mask: cursor.take_u16_be().map_err(map_eof)?,
        },
        0x18 => {
            let byte_count = cursor.take_u16_be().map_err(map_eof)?;
            let fifo_count = cursor.take_u16_be().map_err(map_eof)?;
            if usize::from(byte_count) != usize::from(fifo_count) * 2 + 2 {
                return Err(ParseError::field(SIDE, "byte_count", fc_at + 1));
            }
            let mut values = Vec::with_capacity(usize::from(fifo_count));
            for _ in 0..fifo_count {
                values.push(cursor.take_u16_be().map_err(map_eof)?);
            }
            ModbusRspData::ReadFifoQueue { values }
        }
        _ => return Err(ParseError::field(SIDE, "function_code", fc_at)),
    };

    let header = ModbusRspHeader {
        mbap,
        function_code,
        data,
    };
    Ok((header, NextProtocolHint::Terminal))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// MBAP + PDU for a ReadCoils request: address 0, count 10.
    pub(crate) fn read_coils_req() -> Vec<u8> {
        vec![
            0x01, 0x00, // transaction
            0x00, 0x00, // protocol
            0x00, 0x06, // length
            0x01, // unit
            0x01, // function: read coils
            0x00, 0x00, // start address
            0x00, 0x0a, // count
        ]
    }

    #[test]
    fn decodes_read_coils_request() {
        let bytes = read_coils_req();
        let mut cursor = ByteCursor::new(&bytes);
        let (header, hint) = decode_modbus_req(&mut cursor).unwrap();
        assert_eq!(header.mbap.transaction_id, 0x0100);
        assert_eq!(header.mbap.unit_id, 1);
        assert_eq!(header.function_code, 1);
        assert_eq!(
            header.data,
            ModbusReqData::ReadCoils {
                start_address: 0,
                count: 10
            }
        );
        assert_eq!(header.start_address(), Some(0));
        assert_eq!(header.end_address(), Some(9));
        assert_eq!(hint, NextProtocolHint::Terminal);
    }

    #[test]
    fn decodes_read_coils_response() {
        let bytes = vec![
            0x01, 0x00, 0x00, 0x00, 0x00, 0x04, 0x01, // mbap
            0x01, 0x01, 0b0000_0101, // fc, byte count, coils
        ];
        let mut cursor = ByteCursor::new(&bytes);
        let (header, _) = decode_modbus_rsp(&mut cursor).unwrap();
        assert_eq!(
            header.data,
            ModbusRspData::ReadCoils {
                coil_status: &[0b0000_0101]
            }
        );
    }

    #[test]
    fn decodes_exception_response() {
        let bytes = vec![
            0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x01, // mbap
            0x81, 0x02, // read coils exception, illegal data address
        ];
        let mut cursor = ByteCursor::new(&bytes);
        let (header, _) = decode_modbus_rsp(&mut cursor).unwrap();
        assert_eq!(header.function_code, 0x81);
        assert_eq!(
            header.data,
            ModbusRspData::Exception { exception_code: 2 }
        );
    }

    #[test]
    fn rejects_nonzero_protocol_id() {
        let mut bytes = read_coils_req();
        bytes[2] = 0x01;
        let mut cursor = ByteCursor::new(&bytes);
        let err = decode_modbus_req(&mut cursor).unwrap_err();
        assert!(matches!(err, ParseError::MalformedField { ref field, .. } if field == "protocol_id"));
    }

    #[test]
    fn rejects_length_beyond_buffer() {
        let mut bytes = read_coils_req();
        bytes[5] = 0x20;
        let mut cursor = ByteCursor::new(&bytes);
        assert!(matches!(
            decode_modbus_req(&mut cursor),
            Err(ParseError::InvalidLength { .. })
        ));
    }

    #[test]
    fn rejects_unknown_function_code() {
        let mut bytes = read_coils_req();
        bytes[7] = 0x63;
        let mut cursor = ByteCursor::new(&bytes);
        let err = decode_modbus_req(&mut cursor).unwrap_err();
        assert!(matches!(err, ParseError::MalformedField { ref field, .. } if field == "function_code"));
    }

    #[test]
    fn write_registers_round_trip() {
        let bytes = vec![
            0x00, 0x01, 0x00, 0x00, 0x00, 0x0b, 0x01, // mbap, length 11
            0x10, // write multiple registers
            0x00, 0x10, // start 16
            0x00, 0x02, // two registers
            0x04, // byte count
            0x12, 0x34, 0x56, 0x78,
        ];
        let mut cursor = ByteCursor::new(&bytes);
        let (header, _) = decode_modbus_req(&mut cursor).unwrap();
        assert_eq!(
            header.data,
            ModbusReqData::WriteMultipleRegisters {
                start_address: 16,
                register_count: 2,
                values: vec![0x1234, 0x5678],
            }
        );
        assert_eq!(header.end_address(), Some(17));
    }
}
