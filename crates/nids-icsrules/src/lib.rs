//! OpenNIDS ICS rule dialect
//!
//! A thin specialization of the generic rule grammar for industrial
//! control protocols: the same header syntax, plus a `modbus.*` option
//! vocabulary (function code, unit id, address and value constraints).
//! Option dispatch checks the ICS table first and falls back to the
//! generic table, and the two tables are namespaced so neither can shadow
//! the other.
//!
//! Parsed rules can be checked for stateless applicability against decoded
//! packets:
//!
//! ```
//! use nids_icsrules::parse_ics_rule;
//!
//! let rule = parse_ics_rule(concat!(
//!     r#"alert modbus any any -> any 502 "#,
//!     r#"(msg:"coil write"; modbus.func:write_single_coil; sid:9000100;)"#,
//! ))
//! .unwrap();
//! assert_eq!(rule.args.len(), 1);
//! ```

mod detect;
mod options;
mod parser;
mod rule;
mod ruleset;

pub use detect::{Detect, DetectResult};
pub use options::{ModbusOption, ValueRange};
pub use parser::parse_ics_rule;
pub use rule::IcsRule;
pub use ruleset::IcsRuleSet;
