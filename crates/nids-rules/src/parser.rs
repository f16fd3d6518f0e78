//! Rule grammar
//!
//! Recursive descent over one logical rule line:
//! `action protocol src_spec src_ports direction dst_spec dst_ports
//! (keyword[:args]; ...)`. Header elements are consumed off a stream
//! scanner that tracks absolute byte offsets, so every error points into
//! the line it came from. Option dispatch is split into a raw scan
//! ([`OptionScanner`]) and typed construction ([`OptionsBuilder`]) so rule
//! dialects can put their own keyword table in front of the generic one.

use std::str::FromStr;

use crate::elements;
use crate::error::{Result, RuleParseError};
use crate::options::{Content, ContentPosKey, SuruleOption};
use crate::surule::{RuleHeader, Surule};
use crate::types::{Action, Direction, IpAddressList, PortList, RuleProtocol};

/// Byte-offset-tracking view over the rule line.
#[derive(Debug, Clone, Copy)]
struct Stream<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Stream<'a> {
    fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.line.len() - trimmed.len();
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.line.len()
    }

    /// Next whitespace-delimited token and its offset.
    fn take_token(&mut self) -> Option<(&'a str, usize)> {
        self.skip_ws();
        if self.is_empty() {
            return None;
        }
        let start = self.pos;
        let rest = self.rest();
        let len = rest
            .find(char::is_whitespace)
            .unwrap_or(rest.len());
        self.pos += len;
        Some((&rest[..len], start))
    }

    /// Next address/port spec: a bracketed list (`[...]`, `![...]`) or a
    /// plain token. Bracket depth is capped at two levels.
    fn take_list_token(&mut self) -> Result<(&'a str, usize)> {
        self.skip_ws();
        if self.is_empty() {
            return Err(RuleParseError::SyntaxError {
                offset: self.pos,
                expected: "address or port spec",
            });
        }
        let start = self.pos;
        let rest = self.rest();
        if !rest.starts_with('[') && !rest.starts_with("![") {
            return self.take_token().ok_or(RuleParseError::SyntaxError {
                offset: start,
                expected: "address or port spec",
            });
        }

        let mut depth = 0usize;
        for (i, c) in rest.char_indices() {
            match c {
                '[' => {
                    depth += 1;
                    if depth > 2 {
                        return Err(RuleParseError::ListDepthOverflow);
                    }
                }
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += i + 1;
                        return Ok((&rest[..i + 1], start));
                    }
                }
                _ => {}
            }
        }
        Err(RuleParseError::UnterminatedList)
    }

    /// Consume `ch` if it is next (after whitespace).
    fn eat(&mut self, ch: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    /// Scan up to an unescaped terminator, returning the consumed text.
    fn take_until_unescaped(&mut self, terminators: &[char]) -> Option<(&'a str, char)> {
        let rest = self.rest();
        let mut escaped = false;
        for (i, c) in rest.char_indices() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if terminators.contains(&c) {
                self.pos += i + c.len_utf8();
                return Some((&rest[..i], c));
            }
        }
        None
    }
}

/// One scanned-but-untyped rule option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawOption<'a> {
    pub keyword: &'a str,
    pub value: Option<&'a str>,
    /// Byte offset of the keyword within the rule line.
    pub offset: usize,
}

/// Scans the `(...)` option section one raw option at a time.
#[derive(Debug)]
pub struct OptionScanner<'a> {
    stream: Stream<'a>,
    done: bool,
}

impl<'a> OptionScanner<'a> {
    /// The next raw option, or `None` once `)` is reached.
    pub fn next_raw(&mut self) -> Result<Option<RawOption<'a>>> {
        if self.done {
            return Ok(None);
        }
        if self.stream.eat(')') {
            self.done = true;
            return Ok(None);
        }
        self.stream.skip_ws();
        let name_at = self.stream.pos;
        let (name, sep) = self
            .stream
            .take_until_unescaped(&[':', ';'])
            .ok_or(RuleParseError::UnterminatedOptionName(name_at))?;
        let keyword = name.trim_end();
        if keyword.is_empty() {
            return Err(RuleParseError::SyntaxError {
                offset: name_at,
                expected: "option keyword",
            });
        }
        if sep == ';' {
            return Ok(Some(RawOption {
                keyword,
                value: None,
                offset: name_at,
            }));
        }
        let value_at = self.stream.pos;
        let (value, _) = self
            .stream
            .take_until_unescaped(&[';'])
            .ok_or(RuleParseError::UnterminatedOptionValue(value_at))?;
        Ok(Some(RawOption {
            keyword,
            value: Some(value.trim()),
            offset: name_at,
        }))
    }

    /// Check nothing but whitespace follows the closing `)`.
    pub fn finish(mut self) -> Result<()> {
        if !self.done {
            return Err(RuleParseError::SyntaxError {
                offset: self.stream.pos,
                expected: ")",
            });
        }
        self.stream.skip_ws();
        if !self.stream.is_empty() {
            return Err(RuleParseError::TrailingInput(
                self.stream.rest().to_string(),
            ));
        }
        Ok(())
    }
}

/// Keywords that take a value; a bare `keyword;` for one of these is a
/// malformed option rather than an unknown keyword.
const VALUED_KEYWORDS: &[&str] = &[
    "msg",
    "sid",
    "rev",
    "classtype",
    "priority",
    "reference",
    "metadata",
    "content",
    "depth",
    "offset",
    "distance",
    "within",
    "pcre",
    "flow",
    "flowbits",
    "dsize",
    "byte_test",
    "byte_jump",
    "isdataat",
];

/// Builds typed options from raw ones, folding content modifiers into the
/// most recent `content`.
#[derive(Debug, Default)]
pub struct OptionsBuilder {
    options: Vec<SuruleOption>,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Vec<SuruleOption> {
        self.options
    }

    fn last_content_mut(&mut self, keyword: &'static str) -> Result<&mut Content> {
        match self.options.last_mut() {
            Some(SuruleOption::Content(content)) => Ok(content),
            _ => Err(RuleParseError::arg(
                keyword,
                "modifier without a preceding content",
            )),
        }
    }

    fn fold_absolute(
        &mut self,
        keyword: &'static str,
        set: impl FnOnce(&mut Option<u64>, &mut Option<u64>) -> Result<()>,
    ) -> Result<()> {
        let content = self.last_content_mut(keyword)?;
        match &mut content.pos_key {
            ContentPosKey::NotSet => {
                let mut depth = None;
                let mut offset = None;
                set(&mut depth, &mut offset)?;
                content.pos_key = ContentPosKey::Absolute { depth, offset };
                Ok(())
            }
            ContentPosKey::Absolute { depth, offset } => set(depth, offset),
            _ => Err(RuleParseError::arg(
                keyword,
                "conflicts with relative or startswith/endswith anchoring",
            )),
        }
    }

    fn fold_relative(
        &mut self,
        keyword: &'static str,
        set: impl FnOnce(&mut Option<u64>, &mut Option<i64>) -> Result<()>,
    ) -> Result<()> {
        let content = self.last_content_mut(keyword)?;
        match &mut content.pos_key {
            ContentPosKey::NotSet => {
                let mut within = None;
                let mut distance = None;
                set(&mut within, &mut distance)?;
                content.pos_key = ContentPosKey::Relative { within, distance };
                Ok(())
            }
            ContentPosKey::Relative { within, distance } => set(within, distance),
            _ => Err(RuleParseError::arg(
                keyword,
                "conflicts with absolute or startswith/endswith anchoring",
            )),
        }
    }

    /// Type one raw option and append (or fold) it.
    ///
    /// An unrecognized keyword fails the rule: there is no generic
    /// fallback, so a rule never silently loses a constraint.
    pub fn push(&mut self, raw: &RawOption<'_>) -> Result<()> {
        let Some(value) = raw.value else {
            return self.push_flag(raw);
        };

        let option = match raw.keyword {
            "msg" => SuruleOption::Message(elements::strip_quotes(value)),
            "sid" => SuruleOption::Sid(elements::parse_u64("sid", value)?),
            "rev" => SuruleOption::Rev(elements::parse_u64("rev", value)?),
            "classtype" => SuruleOption::Classtype(value.to_string()),
            "priority" => SuruleOption::Priority(elements::parse_u64("priority", value)?),
            "reference" => SuruleOption::Reference(value.to_string()),
            "metadata" => SuruleOption::Metadata(elements::parse_metadata(value)),
            "content" => SuruleOption::Content(elements::parse_content(value)?),
            "pcre" => SuruleOption::Pcre(elements::parse_pcre(value)?),
            "flow" => SuruleOption::Flow(value.parse()?),
            "flowbits" => SuruleOption::Flowbits(elements::parse_flowbits(value)?),
            "dsize" => SuruleOption::Dsize(elements::parse_dsize(value)?),
            "byte_test" => SuruleOption::ByteTest(elements::parse_byte_test(value)?),
            "byte_jump" => SuruleOption::ByteJump(elements::parse_byte_jump(value)?),
            "isdataat" => SuruleOption::IsDataAt(elements::parse_isdataat(value)?),
            "depth" => {
                let v = elements::parse_u64("depth", value)?;
                self.fold_absolute("depth", |depth, _| {
                    if depth.is_some() {
                        return Err(RuleParseError::arg("depth", "duplicated modifier"));
                    }
                    *depth = Some(v);
                    Ok(())
                })?;
                return Ok(());
            }
            "offset" => {
                let v = elements::parse_u64("offset", value)?;
                self.fold_absolute("offset", |_, offset| {
                    if offset.is_some() {
                        return Err(RuleParseError::arg("offset", "duplicated modifier"));
                    }
                    *offset = Some(v);
                    Ok(())
                })?;
                return Ok(());
            }
            "within" => {
                let v = elements::parse_u64("within", value)?;
                self.fold_relative("within", |within, _| {
                    if within.is_some() {
                        return Err(RuleParseError::arg("within", "duplicated modifier"));
                    }
                    *within = Some(v);
                    Ok(())
                })?;
                return Ok(());
            }
            "distance" => {
                let v = elements::parse_i64("distance", value)?;
                self.fold_relative("distance", |_, distance| {
                    if distance.is_some() {
                        return Err(RuleParseError::arg("distance", "duplicated modifier"));
                    }
                    *distance = Some(v);
                    Ok(())
                })?;
                return Ok(());
            }
            "nocase" | "fast_pattern" | "startswith" | "endswith" => {
                return Err(RuleParseError::arg(
                    match raw.keyword {
                        "nocase" => "nocase",
                        "fast_pattern" => "fast_pattern",
                        "startswith" => "startswith",
                        _ => "endswith",
                    },
                    "takes no argument",
                ));
            }
            _ => {
                return Err(RuleParseError::UnknownKeyword {
                    keyword: raw.keyword.to_string(),
                    offset: raw.offset,
                });
            }
        };
        self.options.push(option);
        Ok(())
    }

    fn push_flag(&mut self, raw: &RawOption<'_>) -> Result<()> {
        match raw.keyword {
            "nocase" => {
                let content = self.last_content_mut("nocase")?;
                if content.nocase {
                    return Err(RuleParseError::arg("nocase", "duplicated modifier"));
                }
                content.nocase = true;
            }
            "fast_pattern" => {
                let content = self.last_content_mut("fast_pattern")?;
                if content.fast_pattern {
                    return Err(RuleParseError::arg("fast_pattern", "duplicated modifier"));
                }
                content.fast_pattern = true;
            }
            "startswith" => {
                let content = self.last_content_mut("startswith")?;
                if content.pos_key != ContentPosKey::NotSet {
                    return Err(RuleParseError::arg(
                        "startswith",
                        "conflicts with other anchoring",
                    ));
                }
                content.pos_key = ContentPosKey::StartsWith;
            }
            "endswith" => {
                let content = self.last_content_mut("endswith")?;
                if content.pos_key != ContentPosKey::NotSet {
                    return Err(RuleParseError::arg(
                        "endswith",
                        "conflicts with other anchoring",
                    ));
                }
                content.pos_key = ContentPosKey::EndsWith;
            }
            kw if VALUED_KEYWORDS.contains(&kw) => {
                return Err(RuleParseError::SyntaxError {
                    offset: raw.offset,
                    expected: "option value after `:`",
                });
            }
            _ => {
                return Err(RuleParseError::UnknownKeyword {
                    keyword: raw.keyword.to_string(),
                    offset: raw.offset,
                });
            }
        }
        Ok(())
    }
}

/// Parse the rule header and hand back a scanner positioned on the first
/// option. Dialect parsers (the ICS layer) call this and run their own
/// option dispatch.
pub fn parse_header(input: &str) -> Result<(RuleHeader, OptionScanner<'_>)> {
    let mut stream = Stream::new(input);

    let (action_str, _) = stream.take_token().ok_or(RuleParseError::EmptyInput)?;
    let action = Action::from_str(action_str)?;

    let (protocol_str, protocol_at) = stream.take_token().ok_or(RuleParseError::SyntaxError {
        offset: input.len(),
        expected: "protocol",
    })?;
    let protocol = RuleProtocol::from_keyword(protocol_str).ok_or_else(|| {
        RuleParseError::UnrecognizedProtocol {
            name: protocol_str.to_string(),
            offset: protocol_at,
        }
    })?;

    let (src_addr_str, _) = stream.take_list_token()?;
    let src_addr: IpAddressList = elements::parse_list(src_addr_str)?;
    let (src_port_str, _) = stream.take_list_token()?;
    let src_port: PortList = elements::parse_list(src_port_str)?;

    let (direction_str, _) = stream.take_token().ok_or(RuleParseError::SyntaxError {
        offset: input.len(),
        expected: "direction",
    })?;
    let direction = match direction_str {
        "->" => Direction::Uni,
        "<>" => Direction::Bi,
        other => return Err(RuleParseError::InvalidDirection(other.to_string())),
    };

    let (dst_addr_str, _) = stream.take_list_token()?;
    let dst_addr: IpAddressList = elements::parse_list(dst_addr_str)?;
    let (dst_port_str, _) = stream.take_list_token()?;
    let dst_port: PortList = elements::parse_list(dst_port_str)?;

    if !stream.eat('(') {
        return Err(RuleParseError::MissingOptions);
    }

    let header = RuleHeader {
        action,
        protocol,
        src_addr,
        src_port,
        direction,
        dst_addr,
        dst_port,
    };
    Ok((
        header,
        OptionScanner {
            stream,
            done: false,
        },
    ))
}

/// Parse one rule line into a [`Surule`].
///
/// Pure function of its input: re-parsing the same line yields a
/// structurally equal rule.
pub fn parse_rule(input: &str) -> Result<Surule> {
    let (header, mut scanner) = parse_header(input)?;
    let mut builder = OptionsBuilder::new();
    while let Some(raw) = scanner.next_raw()? {
        builder.push(&raw)?;
    }
    scanner.finish()?;
    Ok(Surule::new(header, builder.finish()))
}
