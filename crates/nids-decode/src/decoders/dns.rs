//! DNS message (header, question section, answer records)

use super::NextProtocolHint;
use crate::cursor::ByteCursor;
use crate::error::{ParseError, Result};
use crate::protocol::ApplicationProtocol;

/// RFC 1035 limit on the presentation form of a name.
const MAX_NAME_LEN: usize = 255;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DnsHeader {
    pub id: u16,
    pub flags: u16,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl DnsHeader {
    pub fn is_response(&self) -> bool {
        self.flags & 0x8000 != 0
    }

    pub fn opcode(&self) -> u8 {
        ((self.flags >> 11) & 0x0f) as u8
    }

    pub fn rcode(&self) -> u8 {
        (self.flags & 0x0f) as u8
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DnsQuestion {
    pub qname: String,
    pub qtype: u16,
    pub qclass: u16,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DnsRecord<'a> {
    pub name: String,
    pub rrtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub rdata: &'a [u8],
}

/// One DNS message. The authority and additional sections are left in
/// `tail` undecoded.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DnsMessage<'a> {
    pub header: DnsHeader,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<DnsRecord<'a>>,
    pub tail: &'a [u8],
}

fn malformed(field: &str, offset: usize) -> ParseError {
    ParseError::field(ApplicationProtocol::Dns, field, offset)
}

/// Read a (possibly compressed) name. Labels before the first compression
/// pointer come off the cursor; pointer targets are resolved against the
/// whole message. Every pointer must jump strictly backwards, which bounds
/// the walk and rejects pointer loops.
fn read_name(msg: &[u8], cursor: &mut ByteCursor<'_>) -> Result<String> {
    let map_eof = |e| ParseError::eof(ApplicationProtocol::Dns, e);
    let mut labels: Vec<String> = Vec::new();
    let mut total_len = 0usize;

    let push_label = |labels: &mut Vec<String>, total_len: &mut usize, bytes: &[u8], at: usize| {
        *total_len += bytes.len() + 1;
        if *total_len > MAX_NAME_LEN {
            return Err(malformed("name", at));
        }
        labels.push(String::from_utf8_lossy(bytes).into_owned());
        Ok(())
    };

    loop {
        let at = cursor.position();
        let len = cursor.take_u8().map_err(map_eof)?;
        if len == 0 {
            break;
        }
        if len & 0xc0 == 0xc0 {
            let low = cursor.take_u8().map_err(map_eof)?;
            let mut target = (usize::from(len & 0x3f) << 8) | usize::from(low);
            // Resolve the pointer chain inside the raw message.
            let mut bound = at;
            loop {
                if target >= bound {
                    return Err(malformed("name", at));
                }
                let lbl_len = usize::from(msg[target]);
                if lbl_len == 0 {
                    break;
                }
                if lbl_len & 0xc0 == 0xc0 {
                    if target + 1 >= msg.len() {
                        return Err(malformed("name", at));
                    }
                    let next = ((lbl_len & 0x3f) << 8) | usize::from(msg[target + 1]);
                    bound = target;
                    target = next;
                    continue;
                }
                if target + 1 + lbl_len > msg.len() {
                    return Err(malformed("name", at));
                }
                push_label(
                    &mut labels,
                    &mut total_len,
                    &msg[target + 1..target + 1 + lbl_len],
                    at,
                )?;
                target += 1 + lbl_len;
                if target >= msg.len() {
                    return Err(malformed("name", at));
                }
            }
            break;
        }
        if len & 0xc0 != 0 {
            return Err(malformed("name", at));
        }
        let bytes = cursor.take(usize::from(len)).map_err(map_eof)?;
        push_label(&mut labels, &mut total_len, bytes, at)?;
    }

    Ok(labels.join("."))
}

pub(crate) fn decode_dns<'a>(
    cursor: &mut ByteCursor<'a>,
) -> Result<(DnsMessage<'a>, NextProtocolHint)> {
    let map_eof = |e| ParseError::eof(ApplicationProtocol::Dns, e);

    // Compression offsets are message-relative, so work in a cursor rooted
    // at the message start.
    let msg = cursor.take_all();
    let mut mcur = ByteCursor::new(msg);

    let id = mcur.take_u16_be().map_err(map_eof)?;
    let flags = mcur.take_u16_be().map_err(map_eof)?;
    let qdcount = mcur.take_u16_be().map_err(map_eof)?;
    let ancount = mcur.take_u16_be().map_err(map_eof)?;
    let nscount = mcur.take_u16_be().map_err(map_eof)?;
    let arcount = mcur.take_u16_be().map_err(map_eof)?;

    let header = DnsHeader {
        id,
        flags,
        qdcount,
        ancount,
        nscount,
        arcount,
    };

    let mut questions = Vec::with_capacity(usize::from(qdcount).min(16));
    for _ in 0..qdcount {
        let qname = read_name(msg, &mut mcur)?;
        let qtype = mcur.take_u16_be().map_err(map_eof)?;
        let qclass = mcur.take_u16_be().map_err(map_eof)?;
        questions.push(DnsQuestion {
            qname,
            qtype,
            qclass,
        });
    }

    let mut answers = Vec::with_capacity(usize::from(ancount).min(16));
    for _ in 0..ancount {
        let name = read_name(msg, &mut mcur)?;
        let rrtype = mcur.take_u16_be().map_err(map_eof)?;
        let class = mcur.take_u16_be().map_err(map_eof)?;
        let ttl = mcur.take_u32_be().map_err(map_eof)?;
        let rdlength = mcur.take_u16_be().map_err(map_eof)?;
        let rdata = mcur.take(usize::from(rdlength)).map_err(map_eof)?;
        answers.push(DnsRecord {
            name,
            rrtype,
            class,
            ttl,
            rdata,
        });
    }

    let message = DnsMessage {
        header,
        questions,
        answers,
        tail: mcur.take_all(),
    };
    Ok((message, NextProtocolHint::Terminal))
}
