//! Heuristic application-protocol labeling
//!
//! When no strict decoder claims a payload the pipeline asks this sniffer
//! for a best-effort label. The result is a guess, kept apart from the
//! verified [`ApplicationProtocol`](crate::ApplicationProtocol) layers.

use crate::protocol::ApplicationNaiveProtocol;

const HTTP_METHODS: [&[u8]; 8] = [
    b"GET ", b"POST ", b"PUT ", b"DELETE ", b"HEAD ", b"OPTIONS ", b"PATCH ", b"TRACE ",
];

fn looks_like_http(payload: &[u8]) -> bool {
    payload.starts_with(b"HTTP/1.") || HTTP_METHODS.iter().any(|m| payload.starts_with(m))
}

fn looks_like_tls(payload: &[u8]) -> bool {
    payload.len() >= 5 && (20..=23).contains(&payload[0]) && payload[1] == 0x03 && payload[2] <= 4
}

fn looks_like_dns(payload: &[u8]) -> bool {
    if payload.len() < 12 {
        return false;
    }
    let opcode = (payload[2] >> 3) & 0x0f;
    let qdcount = u16::from_be_bytes([payload[4], payload[5]]);
    let ancount = u16::from_be_bytes([payload[6], payload[7]]);
    opcode <= 5 && (1..=8).contains(&qdcount) && ancount <= 64
}

fn looks_like_modbus(payload: &[u8]) -> bool {
    if payload.len() < 8 {
        return false;
    }
    let protocol_id = u16::from_be_bytes([payload[2], payload[3]]);
    let length = usize::from(u16::from_be_bytes([payload[4], payload[5]]));
    protocol_id == 0 && length + 6 == payload.len()
}

/// Guess the application protocol of an undecoded payload.
pub fn sniff_application(payload: &[u8]) -> Option<ApplicationNaiveProtocol> {
    if looks_like_http(payload) {
        Some(ApplicationNaiveProtocol::Http)
    } else if looks_like_tls(payload) {
        Some(ApplicationNaiveProtocol::Tls)
    } else if looks_like_modbus(payload) {
        Some(ApplicationNaiveProtocol::Modbus)
    } else if looks_like_dns(payload) {
        Some(ApplicationNaiveProtocol::Dns)
    } else {
        None
    }
}
