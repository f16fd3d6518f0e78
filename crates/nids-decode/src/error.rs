//! Decode error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cursor::CursorError;
use crate::protocol::ProtocolType;

/// A structural decode failure.
///
/// Every variant names the protocol whose header was being read and enough
/// context to report the failure without access to the input buffer. A
/// `ParseError` aborts the whole decode; running into an *unrecognized*
/// payload type is not an error (the pipeline stops gracefully instead).
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParseError {
    /// The buffer ended before a declared or required length was satisfied.
    #[error("unexpected end of input while decoding {protocol} at offset {offset}")]
    UnexpectedEof {
        protocol: ProtocolType,
        offset: usize,
    },

    /// A header self-consistency checksum did not match.
    #[error("{protocol} checksum mismatch: expected {expected:#06x}, found {found:#06x}")]
    InvalidChecksum {
        protocol: ProtocolType,
        expected: u16,
        found: u16,
    },

    /// A length field disagrees with the bytes actually available.
    #[error("{protocol} length field declares {declared} bytes, {available} available")]
    InvalidLength {
        protocol: ProtocolType,
        declared: usize,
        available: usize,
    },

    /// A version field is outside the recognized domain.
    #[error("unsupported {protocol} version {found}")]
    UnsupportedVersion { protocol: ProtocolType, found: u8 },

    /// A header field's value is outside the recognized domain.
    #[error("malformed {protocol} field `{field}` at offset {offset}")]
    MalformedField {
        protocol: ProtocolType,
        field: String,
        offset: usize,
    },
}

impl ParseError {
    /// Wrap a cursor overrun as an end-of-input failure for `protocol`.
    pub(crate) fn eof(protocol: impl Into<ProtocolType>, err: CursorError) -> Self {
        ParseError::UnexpectedEof {
            protocol: protocol.into(),
            offset: err.position,
        }
    }

    pub(crate) fn field(
        protocol: impl Into<ProtocolType>,
        field: &str,
        offset: usize,
    ) -> Self {
        ParseError::MalformedField {
            protocol: protocol.into(),
            field: field.to_string(),
            offset,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{NetworkProtocol, TransportProtocol};

    #[test]
    fn errors_serialize_for_diagnostics() {
        let err = ParseError::InvalidChecksum {
            protocol: NetworkProtocol::Ipv4.into(),
            expected: 0xb1e6,
            found: 0x0000,
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: ParseError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn messages_name_the_protocol() {
        let err = ParseError::UnexpectedEof {
            protocol: TransportProtocol::Tcp.into(),
            offset: 14,
        };
        assert!(err.to_string().contains("tcp"));
        assert!(err.to_string().contains("14"));
    }
}
