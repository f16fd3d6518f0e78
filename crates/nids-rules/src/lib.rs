//! OpenNIDS rule-language parser
//!
//! Parses Suricata-compatible intrusion-detection rules into typed
//! [`Surule`] values: a validated header (action, protocol, address and
//! port specs, direction) plus an ordered sequence of typed options.
//!
//! The grammar is strict: an unknown option keyword or a malformed
//! argument fails the whole rule with a positioned [`RuleParseError`]
//! instead of silently dropping the option, so a rule that parses means
//! exactly what it says. The multi-line [`RuleSet`] driver is the
//! forgiving layer: it skips bad lines and keeps the rest.
//!
//! Rule protocols resolve against the decode crate's protocol taxonomy, so
//! a parsed rule can be checked for applicability against a decoded packet:
//!
//! ```
//! use nids_rules::parse_rule;
//!
//! let rule = parse_rule(
//!     r#"alert tcp any any -> any 445 (msg:"smb probe"; sid:1000001;)"#,
//! ).unwrap();
//! assert_eq!(rule.sid(), Some(1000001));
//! ```

mod elements;
mod error;
mod options;
mod parser;
mod ruleset;
mod surule;
mod types;

pub use error::{Result, RuleParseError};
pub use options::{
    ByteJump, ByteJumpFrom, ByteTest, ByteTestOp, Content, ContentPosKey, Dsize, Endian, Flow,
    FlowMatcher, Flowbits, FlowbitCommand, IsDataAt, NumType, Pcre, SuruleOption,
};
pub use parser::{parse_header, parse_rule, OptionScanner, OptionsBuilder, RawOption};
pub use ruleset::RuleSet;
pub use surule::{RuleHeader, Surule};
pub use types::{Action, Direction, IpAddress, IpAddressList, Port, PortList, RuleProtocol};
