//! TLS record header and ClientHello

use super::NextProtocolHint;
use crate::cursor::ByteCursor;
use crate::error::{ParseError, Result};
use crate::protocol::ApplicationProtocol;

pub const CONTENT_TYPE_CHANGE_CIPHER_SPEC: u8 = 20;
pub const CONTENT_TYPE_ALERT: u8 = 21;
pub const CONTENT_TYPE_HANDSHAKE: u8 = 22;
pub const CONTENT_TYPE_APPLICATION_DATA: u8 = 23;

/// Fields lifted from a handshake ClientHello.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ClientHello {
    pub version: u16,
    pub sni: Option<String>,
    pub cipher_suites: Vec<u16>,
    pub extensions: Vec<u16>,
}

/// One TLS record. `client_hello` is populated when the record carries a
/// handshake ClientHello; other record bodies stay opaque in `fragment`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TlsHeader<'a> {
    pub content_type: u8,
    /// Record-layer protocol version.
    pub version: u16,
    pub length: u16,
    pub client_hello: Option<ClientHello>,
    pub fragment: &'a [u8],
}

fn malformed(field: &str, offset: usize) -> ParseError {
    ParseError::field(ApplicationProtocol::Tls, field, offset)
}

fn parse_client_hello(fragment: &[u8]) -> Result<Option<ClientHello>> {
    let map_eof = |e| ParseError::eof(ApplicationProtocol::Tls, e);
    let mut cur = ByteCursor::new(fragment);

    let handshake_type = cur.take_u8().map_err(map_eof)?;
    if handshake_type != 1 {
        return Ok(None); // some other handshake message
    }
    let len_hi = cur.take_u8().map_err(map_eof)?;
    let len_lo = cur.take_u16_be().map_err(map_eof)?;
    let declared = (usize::from(len_hi) << 16) | usize::from(len_lo);
    if declared > cur.remaining() {
        return Err(ParseError::InvalidLength {
            protocol: ApplicationProtocol::Tls.into(),
            declared,
            available: cur.remaining(),
        });
    }

    let version = cur.take_u16_be().map_err(map_eof)?;
    cur.skip(32).map_err(map_eof)?; // random
    let session_id_len = cur.take_u8().map_err(map_eof)?;
    cur.skip(usize::from(session_id_len)).map_err(map_eof)?;

    let cipher_len = cur.take_u16_be().map_err(map_eof)?;
    if cipher_len % 2 != 0 {
        return Err(malformed("cipher_suites", cur.position()));
    }
    let mut cipher_suites = Vec::with_capacity(usize::from(cipher_len / 2).min(64));
    for _ in 0..cipher_len / 2 {
        cipher_suites.push(cur.take_u16_be().map_err(map_eof)?);
    }

    let compression_len = cur.take_u8().map_err(map_eof)?;
    cur.skip(usize::from(compression_len)).map_err(map_eof)?;

    let mut extensions = Vec::new();
    let mut sni = None;
    if !cur.is_empty() {
        let ext_total = cur.take_u16_be().map_err(map_eof)?;
        cur.limit(usize::from(ext_total)).map_err(map_eof)?;
        while !cur.is_empty() {
            let ext_type = cur.take_u16_be().map_err(map_eof)?;
            let ext_len = cur.take_u16_be().map_err(map_eof)?;
            let body = cur.take(usize::from(ext_len)).map_err(map_eof)?;
            extensions.push(ext_type);
            if ext_type == 0 && sni.is_none() {
                sni = parse_sni(body);
            }
        }
    }

    Ok(Some(ClientHello {
        version,
        sni,
        cipher_suites,
        extensions,
    }))
}

/// server_name extension body: list length, name type, name length, name.
fn parse_sni(body: &[u8]) -> Option<String> {
    let mut cur = ByteCursor::new(body);
    let _list_len = cur.take_u16_be().ok()?;
    let name_type = cur.take_u8().ok()?;
    if name_type != 0 {
        return None;
    }
    let name_len = cur.take_u16_be().ok()?;
    let name = cur.take(usize::from(name_len)).ok()?;
    std::str::from_utf8(name).ok().map(|s| s.to_string())
}

pub(crate) fn decode_tls<'a>(
    cursor: &mut ByteCursor<'a>,
) -> Result<(TlsHeader<'a>, NextProtocolHint)> {
    let map_eof = |e| ParseError::eof(ApplicationProtocol::Tls, e);
    let start = cursor.position();

    let content_type = cursor.take_u8().map_err(map_eof)?;
    if !(CONTENT_TYPE_CHANGE_CIPHER_SPEC..=CONTENT_TYPE_APPLICATION_DATA).contains(&content_type)
    {
        return Err(malformed("content_type", start));
    }
    let version = cursor.take_u16_be().map_err(map_eof)?;
    if version >> 8 != 0x03 {
        return Err(ParseError::UnsupportedVersion {
            protocol: ApplicationProtocol::Tls.into(),
            found: (version >> 8) as u8,
        });
    }
    let length = cursor.take_u16_be().map_err(map_eof)?;
    let declared = usize::from(length);
    if declared > cursor.remaining() {
        return Err(ParseError::InvalidLength {
            protocol: ApplicationProtocol::Tls.into(),
            declared,
            available: cursor.remaining(),
        });
    }
    let fragment = cursor.take(declared).map_err(map_eof)?;

    let client_hello = if content_type == CONTENT_TYPE_HANDSHAKE {
        parse_client_hello(fragment)?
    } else {
        None
    };

    let header = TlsHeader {
        content_type,
        version,
        length,
        client_hello,
        fragment,
    };
    Ok((header, NextProtocolHint::Terminal))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Handshake record with a ClientHello carrying an SNI for `host`.
    pub(crate) fn client_hello_bytes(host: &str) -> Vec<u8> {
        let mut hello = Vec::new();
        hello.extend_from_slice(&[0x03, 0x03]); // TLS 1.2
        hello.extend_from_slice(&[0u8; 32]); // random
        hello.push(0); // session id
        hello.extend_from_slice(&[0x00, 0x04, 0x13, 0x01, 0x13, 0x02]); // two suites
        hello.extend_from_slice(&[0x01, 0x00]); // null compression

        let mut sni_body = Vec::new();
        sni_body.extend_from_slice(&((host.len() + 3) as u16).to_be_bytes());
        sni_body.push(0);
        sni_body.extend_from_slice(&(host.len() as u16).to_be_bytes());
        sni_body.extend_from_slice(host.as_bytes());

        let mut exts = Vec::new();
        exts.extend_from_slice(&[0x00, 0x00]); // server_name
        exts.extend_from_slice(&(sni_body.len() as u16).to_be_bytes());
        exts.extend_from_slice(&sni_body);

        hello.extend_from_slice(&(exts.len() as u16).to_be_bytes());
        hello.extend_from_slice(&exts);

        let mut handshake = vec![0x01];
        let len = hello.len();
        handshake.push((len >> 16) as u8);
        handshake.push((len >> 8) as u8);
        handshake.push(len as u8);
        handshake.extend_from_slice(&hello);

        let mut record = vec![0x16, 0x03, 0x01];
        record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
        record.extend_from_slice(&handshake);
        record
    }

    #[test]
    fn decodes_client_hello_with_sni() {
        let bytes = client_hello_bytes("example.com");
        let mut cursor = ByteCursor::new(&bytes);
        let (header, hint) = decode_tls(&mut cursor).unwrap();
        assert_eq!(header.content_type, CONTENT_TYPE_HANDSHAKE);
        let hello = header.client_hello.expect("client hello");
        assert_eq!(hello.version, 0x0303);
        assert_eq!(hello.sni.as_deref(), Some("example.com"));
        assert_eq!(hello.cipher_suites, vec![0x1301, 0x1302]);
        assert_eq!(hello.extensions, vec![0]);
        assert_eq!(hint, NextProtocolHint::Terminal);
    }

    #[test]
    fn application_data_record_stays_opaque() {
        let bytes = [0x17, 0x03, 0x03, 0x00, 0x03, 0xde, 0xad, 0xbe];
        let mut cursor = ByteCursor::new(&bytes);
        let (header, _) = decode_tls(&mut cursor).unwrap();
        assert_eq!(header.content_type, CONTENT_TYPE_APPLICATION_DATA);
        assert!(header.client_hello.is_none());
        assert_eq!(header.fragment, &[0xde, 0xad, 0xbe]);
    }

    #[test]
    fn rejects_non_tls_content_type() {
        let bytes = [0x47, 0x03, 0x01, 0x00, 0x00];
        let mut cursor = ByteCursor::new(&bytes);
        let err = decode_tls(&mut cursor).unwrap_err();
        assert!(matches!(err, ParseError::MalformedField { ref field, .. } if field == "content_type"));
    }

    #[test]
    fn rejects_wrong_record_version() {
        let bytes = [0x16, 0x04, 0x01, 0x00, 0x00];
        let mut cursor = ByteCursor::new(&bytes);
        assert!(matches!(
            decode_tls(&mut cursor),
            Err(ParseError::UnsupportedVersion { found: 4, .. })
        ));
    }

    #[test]
    fn record_length_beyond_buffer_is_rejected() {
        let bytes = [0x16, 0x03, 0x01, 0x00, 0x10, 0x01];
        let mut cursor = ByteCursor::new(&bytes);
        assert!(matches!(
            decode_tls(&mut cursor),
            Err(ParseError::InvalidLength { .. })
        ));
    }
}
