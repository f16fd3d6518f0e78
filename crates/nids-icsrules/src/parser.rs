//! ICS rule dialect parser
//!
//! Delegates header parsing and option scanning to the generic grammar.
//! Option dispatch checks the `modbus.*` table first and falls back to the
//! generic keyword table, so every generic option keeps working inside an
//! ICS rule.

use nids_rules::{
    parse_header, OptionsBuilder, RawOption, Result, RuleParseError, RuleProtocol,
};

use crate::options::{function_code_from_name, ModbusOption, ValueRange};
use crate::rule::IcsRule;

fn parse_u16(keyword: &'static str, input: &str) -> Result<u16> {
    let s = input.trim();
    let (s, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    u16::from_str_radix(s, radix).map_err(|_| RuleParseError::InvalidOptionArgument {
        keyword,
        reason: format!("expected integer, got `{input}`"),
    })
}

fn parse_u8(keyword: &'static str, input: &str) -> Result<u8> {
    let value = parse_u16(keyword, input)?;
    u8::try_from(value).map_err(|_| RuleParseError::InvalidOptionArgument {
        keyword,
        reason: format!("`{input}` does not fit in one byte"),
    })
}

/// `n` or `min<>max`.
fn parse_range(keyword: &'static str, input: &str) -> Result<ValueRange> {
    let text = input.trim();
    if let Some((min, max)) = text.split_once("<>") {
        let min = parse_u16(keyword, min)?;
        let max = parse_u16(keyword, max)?;
        if max < min {
            return Err(RuleParseError::InvalidOptionArgument {
                keyword,
                reason: format!("range {min}<>{max} has max below min"),
            });
        }
        Ok(ValueRange { min, max })
    } else {
        Ok(ValueRange::single(parse_u16(keyword, text)?))
    }
}

fn parse_function(input: &str) -> Result<u8> {
    const KW: &str = "modbus.func";
    let text = input.trim();
    if let Some(code) = function_code_from_name(text) {
        return Ok(code);
    }
    parse_u8(KW, text)
}

fn require_value<'a>(raw: &RawOption<'a>, keyword: &'static str) -> Result<&'a str> {
    let value = raw.value.ok_or(RuleParseError::SyntaxError {
        offset: raw.offset,
        expected: "option value after `:`",
    })?;
    let value = value.trim();
    if value.is_empty() {
        return Err(RuleParseError::InvalidOptionArgument {
            keyword,
            reason: "empty value".to_string(),
        });
    }
    Ok(value)
}

/// Try the ICS keyword table; `None` means "not ours, use the generic
/// table".
fn ics_option(raw: &RawOption<'_>) -> Result<Option<ModbusOption>> {
    let option = match raw.keyword {
        "modbus.func" => {
            ModbusOption::Function(parse_function(require_value(raw, "modbus.func")?)?)
        }
        "modbus.unit" => {
            ModbusOption::Unit(parse_u8("modbus.unit", require_value(raw, "modbus.unit")?)?)
        }
        "modbus.addr" => {
            ModbusOption::Address(parse_range("modbus.addr", require_value(raw, "modbus.addr")?)?)
        }
        "modbus.value" => {
            ModbusOption::Value(parse_range(
                "modbus.value",
                require_value(raw, "modbus.value")?,
            )?)
        }
        _ => return Ok(None),
    };
    Ok(Some(option))
}

/// Parse one ICS rule line.
///
/// Any generic rule is also a valid ICS rule; `modbus.*` options
/// additionally require the header protocol to be `modbus`.
pub fn parse_ics_rule(input: &str) -> Result<IcsRule> {
    let (header, mut scanner) = parse_header(input)?;

    let mut args = Vec::new();
    let mut builder = OptionsBuilder::new();
    while let Some(raw) = scanner.next_raw()? {
        match ics_option(&raw)? {
            Some(option) => {
                if header.protocol != RuleProtocol::Modbus {
                    return Err(RuleParseError::InvalidOptionArgument {
                        keyword: option.keyword(),
                        reason: format!(
                            "requires a modbus rule, header says `{}`",
                            header.protocol.name()
                        ),
                    });
                }
                args.push(option);
            }
            None => builder.push(&raw)?,
        }
    }
    scanner.finish()?;

    Ok(IcsRule {
        header,
        args,
        options: builder.finish(),
    })
}
