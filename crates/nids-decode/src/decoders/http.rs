//! HTTP/1.x message head (start line + header block)
//!
//! Bodies are not framed here: everything after the blank line stays as an
//! opaque body slice. Message reassembly across segments is flow-level work
//! and out of scope for a single-packet decoder.

use super::NextProtocolHint;
use crate::cursor::ByteCursor;
use crate::error::{ParseError, Result};
use crate::protocol::ApplicationProtocol;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct HttpRequest<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub version: &'a str,
    pub headers: Vec<(&'a str, &'a str)>,
    pub body: &'a [u8],
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct HttpResponse<'a> {
    pub version: &'a str,
    pub status_code: u16,
    pub reason: &'a str,
    pub headers: Vec<(&'a str, &'a str)>,
    pub body: &'a [u8],
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum HttpHeader<'a> {
    Request(HttpRequest<'a>),
    Response(HttpResponse<'a>),
}

impl<'a> HttpHeader<'a> {
    pub fn headers(&self) -> &[(&'a str, &'a str)] {
        match self {
            HttpHeader::Request(r) => &r.headers,
            HttpHeader::Response(r) => &r.headers,
        }
    }

    /// First header value with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers()
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    pub fn host(&self) -> Option<&'a str> {
        self.header("host")
    }
}

fn malformed(field: &str, offset: usize) -> ParseError {
    ParseError::field(ApplicationProtocol::Http, field, offset)
}

/// Take one CRLF-terminated line off the cursor as UTF-8 text.
fn read_line<'a>(cursor: &mut ByteCursor<'a>, field: &str) -> Result<&'a str> {
    let at = cursor.position();
    let rest = cursor.rest();
    let end = rest
        .windows(2)
        .position(|w| w == b"\r\n")
        .ok_or_else(|| ParseError::eof(
            ApplicationProtocol::Http,
            crate::cursor::CursorError {
                position: at + rest.len(),
                requested: 2,
                available: 0,
            },
        ))?;
    let line = &rest[..end];
    // take cannot fail: end + 2 <= rest.len()
    cursor
        .skip(end + 2)
        .map_err(|e| ParseError::eof(ApplicationProtocol::Http, e))?;
    std::str::from_utf8(line).map_err(|_| malformed(field, at))
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

fn is_http_version(s: &str) -> bool {
    matches!(s, "HTTP/1.0" | "HTTP/1.1" | "HTTP/0.9")
}

fn parse_headers<'a>(cursor: &mut ByteCursor<'a>) -> Result<Vec<(&'a str, &'a str)>> {
    let mut headers = Vec::new();
    // A packet may end mid-header-block; treat end of input as end of
    // headers rather than failing the already-parsed start line.
    while !cursor.is_empty() {
        let at = cursor.position();
        if cursor.rest().starts_with(b"\r\n") {
            cursor
                .skip(2)
                .map_err(|e| ParseError::eof(ApplicationProtocol::Http, e))?;
            break;
        }
        if !cursor.rest().contains(&b'\n') {
            cursor.take_all();
            break;
        }
        let line = read_line(cursor, "header")?;
        let (name, value) = line.split_once(':').ok_or_else(|| malformed("header", at))?;
        if !is_token(name.trim_end()) {
            return Err(malformed("header", at));
        }
        headers.push((name.trim(), value.trim()));
    }
    Ok(headers)
}

pub(crate) fn decode_http<'a>(
    cursor: &mut ByteCursor<'a>,
) -> Result<(HttpHeader<'a>, NextProtocolHint)> {
    let start = cursor.position();
    let line = read_line(cursor, "start_line")?;

    let header = if line.starts_with("HTTP/") {
        // status line: HTTP/1.x SP code SP reason
        let mut parts = line.splitn(3, ' ');
        let version_str = parts.next().unwrap_or("");
        if !is_http_version(version_str) {
            return Err(malformed("version", start));
        }
        let code_str = parts.next().ok_or_else(|| malformed("status_code", start))?;
        let status_code: u16 = code_str
            .parse()
            .map_err(|_| malformed("status_code", start))?;
        if !(100..=599).contains(&status_code) {
            return Err(malformed("status_code", start));
        }
        let reason = parts.next().unwrap_or("");
        let headers = parse_headers(cursor)?;
        HttpHeader::Response(HttpResponse {
            version: version_str,
            status_code,
            reason,
            headers,
            body: cursor.take_all(),
        })
    } else {
        // request line: METHOD SP uri SP HTTP/1.x
        let mut parts = line.splitn(3, ' ');
        let method = parts.next().unwrap_or("");
        if !is_token(method) || !method.bytes().all(|b| b.is_ascii_uppercase() || b == b'-') {
            return Err(malformed("method", start));
        }
        let uri = parts.next().ok_or_else(|| malformed("uri", start))?;
        if uri.is_empty() {
            return Err(malformed("uri", start));
        }
        let version = parts.next().ok_or_else(|| malformed("version", start))?;
        if !is_http_version(version) {
            return Err(malformed("version", start));
        }
        let headers = parse_headers(cursor)?;
        HttpHeader::Request(HttpRequest {
            method,
            uri,
            version,
            headers,
            body: cursor.take_all(),
        })
    };

    Ok((header, NextProtocolHint::Terminal))
}
