//! Element parsers: header lists and option argument grammars
//!
//! Each option keyword's argument grammar lives here as a standalone,
//! independently-testable parser. Validation is structural (arity and
//! type); no cross-option semantics are checked at parse time.

use std::str::FromStr;

use crate::error::{Result, RuleParseError};
use crate::options::{
    ByteJump, ByteJumpFrom, ByteTest, ByteTestOp, Content, Dsize, Endian, Flow, FlowMatcher,
    Flowbits, FlowbitCommand, IsDataAt, NumType, Pcre,
};
use crate::types::{IpAddress, Port, RuleList};

/// Remove unescaped double quotes and resolve backslash escapes.
pub(crate) fn strip_quotes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut escaped = false;
    for c in input.chars() {
        if escaped {
            match c {
                '"' | '\\' | ';' | ':' => out.push(c),
                _ => {
                    out.push('\\');
                    out.push(c);
                }
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c != '"' {
            out.push(c);
        }
    }
    if escaped {
        out.push('\\');
    }
    out
}

pub(crate) fn parse_u64(keyword: &'static str, input: &str) -> Result<u64> {
    let s = input.trim();
    let (s, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    u64::from_str_radix(s, radix)
        .map_err(|_| RuleParseError::arg(keyword, format!("expected integer, got `{input}`")))
}

pub(crate) fn parse_i64(keyword: &'static str, input: &str) -> Result<i64> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| RuleParseError::arg(keyword, format!("expected integer, got `{input}`")))
}

pub(crate) fn parse_usize(keyword: &'static str, input: &str) -> Result<usize> {
    input
        .trim()
        .parse::<usize>()
        .map_err(|_| RuleParseError::arg(keyword, format!("expected integer, got `{input}`")))
}

/// Split a comma-separated argument pack, trimming leading whitespace.
fn split_commas<'a>(keyword: &'static str, input: &'a str) -> Result<Vec<&'a str>> {
    nom::multi::separated_list1::<_, _, _, nom::error::Error<&str>, _, _>(
        nom::bytes::complete::tag(","),
        nom::sequence::preceded(
            nom::character::complete::multispace0,
            nom::bytes::complete::is_not(","),
        ),
    )(input)
    .map(|(_, values)| values)
    .map_err(|_| RuleParseError::arg(keyword, format!("invalid argument pack `{input}`")))
}

/// First whitespace-separated word plus whatever follows it.
fn split_word(input: &str) -> (&str, &str) {
    let s = input.trim();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

/*
 *  Header element values
 */

impl FromStr for IpAddress {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self> {
        let text = strip_quotes(s.trim());
        let text = text.trim();
        if text.is_empty() {
            return Err(RuleParseError::InvalidAddress(s.to_string()));
        }
        if let Ok(addr) = text.parse() {
            return Ok(IpAddress::Addr(addr));
        }
        text.parse()
            .map(IpAddress::Range)
            .map_err(|_| RuleParseError::InvalidAddress(text.to_string()))
    }
}

impl FromStr for Port {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self> {
        let text = strip_quotes(s.trim());
        let text = text.trim();
        let make_err = || RuleParseError::InvalidPort(s.to_string());

        if let Some((min_str, max_str)) = text.split_once(':') {
            let min = min_str.trim().parse().map_err(|_| make_err())?;
            let max = if max_str.trim().is_empty() {
                u16::MAX
            } else {
                max_str.trim().parse().map_err(|_| make_err())?
            };
            Port::new_range(min, max)
        } else {
            text.parse().map(Port::Single).map_err(|_| make_err())
        }
    }
}

/// Top-level members of a bracketed list. One level of nesting is allowed;
/// deeper nesting is rejected.
fn take_list_members(input: &str) -> Result<Vec<&str>> {
    let mut members = Vec::new();
    let mut depth = 0usize;
    let mut start = 1;
    let mut nested = false;

    if !input.starts_with('[') || !input.ends_with(']') {
        return Err(RuleParseError::InvalidList(input.to_string()));
    }

    for (i, c) in input.char_indices() {
        match c {
            '[' => {
                depth += 1;
                if depth == 2 {
                    nested = true;
                } else if depth > 2 {
                    return Err(RuleParseError::ListDepthOverflow);
                }
            }
            ']' => {
                if depth == 0 {
                    return Err(RuleParseError::InvalidList(input.to_string()));
                }
                depth -= 1;
                if depth == 1 {
                    nested = false;
                } else if depth == 0 {
                    let member = input[start..i].trim();
                    if !member.is_empty() {
                        members.push(member);
                    }
                    break;
                }
            }
            ',' if !nested && depth == 1 => {
                let member = input[start..i].trim();
                if member.is_empty() {
                    return Err(RuleParseError::InvalidList("empty list member".to_string()));
                }
                members.push(member);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(RuleParseError::UnterminatedList);
    }
    Ok(members)
}

fn parse_inner_list<E>(input: &str, out: &mut Option<Vec<E>>) -> Result<()>
where
    E: FromStr<Err = RuleParseError>,
{
    let inner = input
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| RuleParseError::InvalidList(input.to_string()))?;
    for member in inner.split(',') {
        let member = member.trim();
        if member.is_empty() {
            return Err(RuleParseError::InvalidList("empty list member".to_string()));
        }
        out.get_or_insert_with(Vec::new).push(E::from_str(member)?);
    }
    Ok(())
}

/// Parse an address or port spec: `any`, a single value, `!value`, or a
/// bracketed list whose members may be negated or one level of nested list.
pub(crate) fn parse_list<L: RuleList>(input: &str) -> Result<L> {
    let text = strip_quotes(input.trim());
    let mut text = text.trim();
    let mut list = L::default();

    if text == "any" || text == "all" {
        return Ok(list);
    }

    let negated_whole = if let Some(rest) = text.strip_prefix('!') {
        text = rest.trim_start();
        true
    } else {
        false
    };

    if text.starts_with('[') {
        let members = take_list_members(text)?;
        if negated_whole {
            // !["a", "b"]: the whole list is the exception set
            for member in members {
                if member.starts_with('!') || member.starts_with('[') {
                    return Err(RuleParseError::InvalidList(
                        "nested negation inside a negated list".to_string(),
                    ));
                }
                list.except_mut()
                    .get_or_insert_with(Vec::new)
                    .push(L::Element::from_str(member)?);
            }
            return Ok(list);
        }
        for member in members {
            if let Some(rest) = member.strip_prefix('!') {
                let rest = rest.trim_start();
                if rest.starts_with('[') {
                    parse_inner_list(rest, list.except_mut())?;
                } else {
                    list.except_mut()
                        .get_or_insert_with(Vec::new)
                        .push(L::Element::from_str(rest)?);
                }
            } else if member.starts_with('[') {
                parse_inner_list(member, list.accept_mut())?;
            } else {
                list.accept_mut()
                    .get_or_insert_with(Vec::new)
                    .push(L::Element::from_str(member)?);
            }
        }
        Ok(list)
    } else {
        let element = L::Element::from_str(text)?;
        if negated_whole {
            *list.except_mut() = Some(vec![element]);
        } else {
            *list.accept_mut() = Some(vec![element]);
        }
        Ok(list)
    }
}

/*
 *  Option argument grammars
 */

/// `content` pattern: optional `!`, quoted text with `|xx xx|` hex runs.
pub(crate) fn parse_content(input: &str) -> Result<Content> {
    const KW: &str = "content";
    let mut text = input.trim();
    let negated = if let Some(rest) = text.strip_prefix('!') {
        text = rest.trim_start();
        true
    } else {
        false
    };
    let text = strip_quotes(text);

    let mut pattern = Vec::with_capacity(text.len());
    let mut in_hex = false;
    for segment in text.split('|') {
        if in_hex {
            let clean: String = segment.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = hex::decode(&clean)
                .map_err(|_| RuleParseError::arg(KW, format!("bad hex run `{segment}`")))?;
            pattern.extend_from_slice(&bytes);
        } else {
            pattern.extend_from_slice(segment.as_bytes());
        }
        in_hex = !in_hex;
    }
    // every `|` paired leaves an odd number of segments
    if !in_hex {
        return Err(RuleParseError::arg(KW, "unterminated hex run"));
    }
    if pattern.is_empty() {
        return Err(RuleParseError::arg(KW, "empty pattern"));
    }

    Ok(Content {
        pattern,
        negated,
        ..Content::default()
    })
}

/// `pcre`: `[!]"/pattern/modifiers"`. The pattern must be a valid regular
/// expression under the supported modifiers.
pub(crate) fn parse_pcre(input: &str) -> Result<Pcre> {
    const KW: &str = "pcre";
    let text = strip_quotes(input.trim());
    let mut text = text.trim();
    let negate = if let Some(rest) = text.strip_prefix('!') {
        text = rest.trim_start();
        true
    } else {
        false
    };

    if !text.starts_with('/') {
        return Err(RuleParseError::arg(KW, "pattern must start with `/`"));
    }
    let close = text.rfind('/').filter(|&i| i > 0).ok_or_else(|| {
        RuleParseError::arg(KW, "pattern must end with `/modifiers`")
    })?;
    let pattern = text[1..close].to_string();
    let modifiers = &text[close + 1..];

    let mut pcre = Pcre {
        pattern,
        negate,
        ..Pcre::default()
    };
    for m in modifiers.chars() {
        match m {
            'i' => pcre.modifier_i = true,
            'm' => pcre.modifier_m = true,
            's' => pcre.modifier_s = true,
            'x' => pcre.modifier_x = true,
            _ => {
                return Err(RuleParseError::arg(KW, format!("unsupported modifier `{m}`")));
            }
        }
    }

    let mut flags = String::new();
    if pcre.modifier_i {
        flags.push('i');
    }
    if pcre.modifier_m {
        flags.push('m');
    }
    if pcre.modifier_s {
        flags.push('s');
    }
    if pcre.modifier_x {
        flags.push('x');
    }
    let probe = if flags.is_empty() {
        pcre.pattern.clone()
    } else {
        format!("(?{flags}){}", pcre.pattern)
    };
    regex::Regex::new(&probe)
        .map_err(|e| RuleParseError::arg(KW, format!("invalid pattern: {e}")))?;

    Ok(pcre)
}

/// `dsize`: `300`, `!300`, `<300`, `>300`, or `min<>max`.
pub(crate) fn parse_dsize(input: &str) -> Result<Dsize> {
    const KW: &str = "dsize";
    let text = input.trim();
    if let Some((min, max)) = text.split_once("<>") {
        return Ok(Dsize::Range(parse_usize(KW, min)?, parse_usize(KW, max)?));
    }
    if let Some(rest) = text.strip_prefix('!') {
        return Ok(Dsize::NotEqual(parse_usize(KW, rest)?));
    }
    if let Some(rest) = text.strip_prefix('<') {
        return Ok(Dsize::Less(parse_usize(KW, rest)?));
    }
    if let Some(rest) = text.strip_prefix('>') {
        return Ok(Dsize::Greater(parse_usize(KW, rest)?));
    }
    Ok(Dsize::Equal(parse_usize(KW, text)?))
}

/// `isdataat`: `[!]pos[, relative]`.
pub(crate) fn parse_isdataat(input: &str) -> Result<IsDataAt> {
    const KW: &str = "isdataat";
    let values = split_commas(KW, input)?;
    let mut first = values[0].trim();
    let negate = if let Some(rest) = first.strip_prefix('!') {
        first = rest.trim_start();
        true
    } else {
        false
    };
    let mut isdataat = IsDataAt {
        pos: parse_u64(KW, first)?,
        negate,
        relative: false,
    };
    for value in &values[1..] {
        match value.trim() {
            "relative" => {
                if isdataat.relative {
                    return Err(RuleParseError::arg(KW, "duplicated `relative`"));
                }
                isdataat.relative = true;
            }
            other => {
                return Err(RuleParseError::arg(KW, format!("unknown flag `{other}`")));
            }
        }
    }
    Ok(isdataat)
}

/// `byte_test`: `count, [!]op, value, offset[, modifiers...]`.
pub(crate) fn parse_byte_test(input: &str) -> Result<ByteTest> {
    const KW: &str = "byte_test";
    let values = split_commas(KW, input)?;
    if values.len() < 4 {
        return Err(RuleParseError::arg(
            KW,
            "requires count, operator, value and offset",
        ));
    }

    let count: u8 = values[0]
        .trim()
        .parse()
        .map_err(|_| RuleParseError::arg(KW, format!("invalid count `{}`", values[0])))?;
    if count > 8 {
        return Err(RuleParseError::arg(KW, format!("count {count} exceeds 8 bytes")));
    }

    let mut op_str = values[1].trim();
    let negated = if let Some(rest) = op_str.strip_prefix('!') {
        op_str = rest.trim_start();
        true
    } else {
        false
    };
    let op = match op_str {
        "<" => ByteTestOp::Less,
        ">" => ByteTestOp::Greater,
        "=" => ByteTestOp::Equal,
        "<=" => ByteTestOp::LessEqual,
        ">=" => ByteTestOp::GreaterEqual,
        "&" => ByteTestOp::And,
        "^" => ByteTestOp::Or,
        _ => {
            return Err(RuleParseError::arg(KW, format!("unknown operator `{op_str}`")));
        }
    };

    let mut byte_test = ByteTest {
        count,
        negated,
        op,
        value: parse_u64(KW, values[2])?,
        offset: parse_i64(KW, values[3])?,
        relative: false,
        endian: None,
        string: false,
        num_type: None,
        dce: false,
        bitmask: None,
    };

    let mut prev_is_string = false;
    for value in &values[4..] {
        let (name, arg) = split_word(value);
        match name {
            "relative" => {
                if byte_test.relative {
                    return Err(RuleParseError::arg(KW, "duplicated `relative`"));
                }
                byte_test.relative = true;
                prev_is_string = false;
            }
            "big" | "little" => {
                if byte_test.endian.is_some() {
                    return Err(RuleParseError::arg(KW, "duplicated endian"));
                }
                byte_test.endian = Some(if name == "big" {
                    Endian::Big
                } else {
                    Endian::Little
                });
                prev_is_string = false;
            }
            "string" => {
                if byte_test.string {
                    return Err(RuleParseError::arg(KW, "duplicated `string`"));
                }
                byte_test.string = true;
                prev_is_string = true;
            }
            "hex" | "dec" | "oct" => {
                if !prev_is_string {
                    return Err(RuleParseError::arg(
                        KW,
                        format!("`{name}` must follow `string`"),
                    ));
                }
                if byte_test.num_type.is_some() {
                    return Err(RuleParseError::arg(KW, "duplicated number type"));
                }
                byte_test.num_type = Some(match name {
                    "hex" => NumType::Hex,
                    "dec" => NumType::Dec,
                    _ => NumType::Oct,
                });
            }
            "dce" => {
                if byte_test.dce {
                    return Err(RuleParseError::arg(KW, "duplicated `dce`"));
                }
                byte_test.dce = true;
                prev_is_string = false;
            }
            "bitmask" => {
                if byte_test.bitmask.is_some() {
                    return Err(RuleParseError::arg(KW, "duplicated `bitmask`"));
                }
                byte_test.bitmask = Some(parse_u64(KW, arg)?);
                prev_is_string = false;
            }
            _ => {
                return Err(RuleParseError::arg(KW, format!("unknown parameter `{name}`")));
            }
        }
    }
    Ok(byte_test)
}

/// `byte_jump`: `count, offset[, modifiers...]`.
pub(crate) fn parse_byte_jump(input: &str) -> Result<ByteJump> {
    const KW: &str = "byte_jump";
    let values = split_commas(KW, input)?;
    if values.len() < 2 {
        return Err(RuleParseError::arg(KW, "requires count and offset"));
    }

    let count: u8 = values[0]
        .trim()
        .parse()
        .map_err(|_| RuleParseError::arg(KW, format!("invalid count `{}`", values[0])))?;
    if count > 8 {
        return Err(RuleParseError::arg(KW, format!("count {count} exceeds 8 bytes")));
    }

    let mut byte_jump = ByteJump {
        count,
        offset: parse_i64(KW, values[1])?,
        ..ByteJump::default()
    };

    let mut prev_is_string = false;
    for value in &values[2..] {
        let (name, arg) = split_word(value);
        match name {
            "" => continue, // tolerate trailing commas
            "relative" => {
                if byte_jump.relative {
                    return Err(RuleParseError::arg(KW, "duplicated `relative`"));
                }
                byte_jump.relative = true;
                prev_is_string = false;
            }
            "big" | "little" => {
                if byte_jump.endian.is_some() {
                    return Err(RuleParseError::arg(KW, "duplicated endian"));
                }
                byte_jump.endian = Some(if name == "big" {
                    Endian::Big
                } else {
                    Endian::Little
                });
                prev_is_string = false;
            }
            "align" => {
                if byte_jump.align {
                    return Err(RuleParseError::arg(KW, "duplicated `align`"));
                }
                byte_jump.align = true;
                prev_is_string = false;
            }
            "from_beginning" | "from_end" => {
                if byte_jump.from.is_some() {
                    return Err(RuleParseError::arg(
                        KW,
                        "duplicated `from_beginning`/`from_end`",
                    ));
                }
                byte_jump.from = Some(if name == "from_beginning" {
                    ByteJumpFrom::Beginning
                } else {
                    ByteJumpFrom::End
                });
                prev_is_string = false;
            }
            "string" => {
                if byte_jump.string {
                    return Err(RuleParseError::arg(KW, "duplicated `string`"));
                }
                byte_jump.string = true;
                prev_is_string = true;
            }
            "hex" | "dec" | "oct" => {
                if !prev_is_string {
                    return Err(RuleParseError::arg(
                        KW,
                        format!("`{name}` must follow `string`"),
                    ));
                }
                if byte_jump.num_type.is_some() {
                    return Err(RuleParseError::arg(KW, "duplicated number type"));
                }
                byte_jump.num_type = Some(match name {
                    "hex" => NumType::Hex,
                    "dec" => NumType::Dec,
                    _ => NumType::Oct,
                });
            }
            "multiplier" => {
                if byte_jump.multiplier.is_some() {
                    return Err(RuleParseError::arg(KW, "duplicated `multiplier`"));
                }
                byte_jump.multiplier = Some(parse_usize(KW, arg)?);
                prev_is_string = false;
            }
            "post_offset" => {
                if byte_jump.post_offset.is_some() {
                    return Err(RuleParseError::arg(KW, "duplicated `post_offset`"));
                }
                byte_jump.post_offset = Some(parse_i64(KW, arg)?);
                prev_is_string = false;
            }
            "dce" => {
                if byte_jump.dce {
                    return Err(RuleParseError::arg(KW, "duplicated `dce`"));
                }
                byte_jump.dce = true;
                prev_is_string = false;
            }
            "bitmask" => {
                if byte_jump.bitmask.is_some() {
                    return Err(RuleParseError::arg(KW, "duplicated `bitmask`"));
                }
                byte_jump.bitmask = Some(parse_u64(KW, arg)?);
                prev_is_string = false;
            }
            _ => {
                return Err(RuleParseError::arg(KW, format!("unknown parameter `{name}`")));
            }
        }
    }
    Ok(byte_jump)
}

/// `metadata`: free-form comma-separated entries.
pub(crate) fn parse_metadata(input: &str) -> Vec<String> {
    input.split(',').map(|p| p.trim().to_string()).collect()
}

/*
 *  Flow / flowbits
 */

impl FromStr for FlowMatcher {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self> {
        let v = match s {
            "to_client" => Self::ToClient,
            "to_server" => Self::ToServer,
            "from_client" => Self::FromClient,
            "from_server" => Self::FromServer,
            "established" => Self::Established,
            "not_established" => Self::NotEstablished,
            "stateless" => Self::Stateless,
            "only_stream" => Self::OnlyStream,
            "no_stream" => Self::NoStream,
            "only_frag" => Self::OnlyFrag,
            "no_frag" => Self::NoFrag,
            _ => {
                return Err(RuleParseError::arg("flow", format!("unknown flag `{s}`")));
            }
        };
        Ok(v)
    }
}

impl FromStr for Flow {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self> {
        let matchers: Result<Vec<_>> = s
            .split(',')
            .map(|p| FlowMatcher::from_str(p.trim()))
            .collect();
        Ok(Flow(matchers?))
    }
}

impl FromStr for FlowbitCommand {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "noalert" => Ok(Self::NoAlert),
            "set" => Ok(Self::Set),
            "isset" => Ok(Self::IsSet),
            "toggle" => Ok(Self::Toggle),
            "unset" => Ok(Self::Unset),
            "isnotset" => Ok(Self::IsNotSet),
            _ => Err(RuleParseError::arg(
                "flowbits",
                format!("unknown command `{s}`"),
            )),
        }
    }
}

/// `flowbits`: `command[, name|name...]`.
pub(crate) fn parse_flowbits(input: &str) -> Result<Flowbits> {
    const KW: &str = "flowbits";
    let input = input.trim();

    let command_parser = nom::sequence::preceded(
        nom::character::complete::multispace0,
        nom::character::complete::alphanumeric1,
    );
    let names_parser = nom::sequence::preceded(
        nom::bytes::complete::tag(","),
        nom::sequence::preceded(nom::character::complete::multispace0, nom::combinator::rest),
    );
    let (_, (command, names)): (&str, (&str, Option<&str>)) =
        nom::sequence::tuple::<_, _, nom::error::Error<&str>, _>((
            command_parser,
            nom::combinator::opt(names_parser),
        ))(input)
        .map_err(|_| RuleParseError::arg(KW, format!("invalid value `{input}`")))?;

    let command = FlowbitCommand::from_str(command)?;
    match command {
        FlowbitCommand::Set
        | FlowbitCommand::IsSet
        | FlowbitCommand::Toggle
        | FlowbitCommand::Unset
        | FlowbitCommand::IsNotSet => {
            let names = names
                .ok_or_else(|| RuleParseError::arg(KW, format!("{command} requires a name")))?
                .split('|')
                .map(|s| s.trim().to_string())
                .collect();
            Ok(Flowbits { command, names })
        }
        FlowbitCommand::NoAlert => {
            if names.is_some() {
                Err(RuleParseError::arg(KW, "noalert takes no argument"))
            } else {
                Ok(Flowbits {
                    command,
                    names: Vec::new(),
                })
            }
        }
    }
}
