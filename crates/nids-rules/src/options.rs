//! Typed rule option model
//!
//! A closed variant set: every keyword the grammar accepts has a typed
//! payload here, and an unrecognized keyword fails the rule parse. There is
//! deliberately no generic "unknown option" escape hatch.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One rule option, in source order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SuruleOption {
    Message(String),
    Sid(u64),
    Rev(u64),
    Classtype(String),
    Priority(u64),
    Reference(String),
    Metadata(Vec<String>),
    Content(Content),
    Pcre(Pcre),
    Flow(Flow),
    Flowbits(Flowbits),
    Dsize(Dsize),
    ByteTest(ByteTest),
    ByteJump(ByteJump),
    IsDataAt(IsDataAt),
}

impl SuruleOption {
    /// The keyword this option was written with.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Message(_) => "msg",
            Self::Sid(_) => "sid",
            Self::Rev(_) => "rev",
            Self::Classtype(_) => "classtype",
            Self::Priority(_) => "priority",
            Self::Reference(_) => "reference",
            Self::Metadata(_) => "metadata",
            Self::Content(_) => "content",
            Self::Pcre(_) => "pcre",
            Self::Flow(_) => "flow",
            Self::Flowbits(_) => "flowbits",
            Self::Dsize(_) => "dsize",
            Self::ByteTest(_) => "byte_test",
            Self::ByteJump(_) => "byte_jump",
            Self::IsDataAt(_) => "isdataat",
        }
    }
}

/// Content pattern with its position modifiers folded in.
///
/// `pattern` holds decoded bytes: quotes stripped, `|xx xx|` hex runs
/// decoded, escapes resolved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Content {
    pub pattern: Vec<u8>,
    #[serde(skip_serializing_if = "is_false", default)]
    pub negated: bool,
    #[serde(skip_serializing_if = "is_false", default)]
    pub nocase: bool,
    #[serde(skip_serializing_if = "is_false", default)]
    pub fast_pattern: bool,
    #[serde(default)]
    pub pos_key: ContentPosKey,
}

/// Where a content match anchors. Absolute (`depth`/`offset`) and relative
/// (`within`/`distance`) anchoring are mutually exclusive, as are the
/// `startswith`/`endswith` shorthands.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentPosKey {
    #[default]
    NotSet,
    Absolute {
        depth: Option<u64>,
        offset: Option<u64>,
    },
    Relative {
        within: Option<u64>,
        distance: Option<i64>,
    },
    StartsWith,
    EndsWith,
}

/// PCRE option: pattern plus the modifiers the matcher honors.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Pcre {
    pub pattern: String,
    #[serde(skip_serializing_if = "is_false", default)]
    pub negate: bool,
    #[serde(skip_serializing_if = "is_false", default)]
    pub modifier_i: bool,
    #[serde(skip_serializing_if = "is_false", default)]
    pub modifier_m: bool,
    #[serde(skip_serializing_if = "is_false", default)]
    pub modifier_s: bool,
    #[serde(skip_serializing_if = "is_false", default)]
    pub modifier_x: bool,
}

/// Flow constraint flags.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Flow(pub Vec<FlowMatcher>);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowMatcher {
    ToClient,
    ToServer,
    FromClient,
    FromServer,
    Established,
    NotEstablished,
    Stateless,
    OnlyStream,
    NoStream,
    OnlyFrag,
    NoFrag,
}

impl FlowMatcher {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToClient => "to_client",
            Self::ToServer => "to_server",
            Self::FromClient => "from_client",
            Self::FromServer => "from_server",
            Self::Established => "established",
            Self::NotEstablished => "not_established",
            Self::Stateless => "stateless",
            Self::OnlyStream => "only_stream",
            Self::NoStream => "no_stream",
            Self::OnlyFrag => "only_frag",
            Self::NoFrag => "no_frag",
        }
    }
}

/// Flowbits command + names.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Flowbits {
    pub command: FlowbitCommand,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub names: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowbitCommand {
    NoAlert,
    Set,
    IsSet,
    Toggle,
    Unset,
    IsNotSet,
}

impl fmt::Display for FlowbitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NoAlert => "noalert",
            Self::Set => "set",
            Self::IsSet => "isset",
            Self::Toggle => "toggle",
            Self::Unset => "unset",
            Self::IsNotSet => "isnotset",
        };
        f.write_str(label)
    }
}

/// Payload size constraint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Dsize {
    Equal(usize),
    NotEqual(usize),
    Less(usize),
    Greater(usize),
    Range(usize, usize),
}

impl Dsize {
    pub fn matches(&self, len: usize) -> bool {
        match *self {
            Self::Equal(n) => len == n,
            Self::NotEqual(n) => len != n,
            Self::Less(n) => len < n,
            Self::Greater(n) => len > n,
            Self::Range(min, max) => min < len && len < max,
        }
    }
}

/// Byte order for byte_test/byte_jump extraction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Big,
    Little,
}

/// Radix used when converted bytes are read as a decimal string.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NumType {
    Hex,
    Dec,
    Oct,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ByteTestOp {
    Less,
    Greater,
    Equal,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

/// `byte_test: count, [!]op, value, offset[, modifiers...]`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ByteTest {
    pub count: u8,
    #[serde(skip_serializing_if = "is_false", default)]
    pub negated: bool,
    pub op: ByteTestOp,
    pub value: u64,
    pub offset: i64,
    #[serde(skip_serializing_if = "is_false", default)]
    pub relative: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub endian: Option<Endian>,
    #[serde(skip_serializing_if = "is_false", default)]
    pub string: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub num_type: Option<NumType>,
    #[serde(skip_serializing_if = "is_false", default)]
    pub dce: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bitmask: Option<u64>,
}

/// Where a byte_jump starts counting from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ByteJumpFrom {
    Beginning,
    End,
}

/// `byte_jump: count, offset[, modifiers...]`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ByteJump {
    pub count: u8,
    pub offset: i64,
    #[serde(skip_serializing_if = "is_false", default)]
    pub relative: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub multiplier: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub endian: Option<Endian>,
    #[serde(skip_serializing_if = "is_false", default)]
    pub string: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub num_type: Option<NumType>,
    #[serde(skip_serializing_if = "is_false", default)]
    pub align: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub from: Option<ByteJumpFrom>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub post_offset: Option<i64>,
    #[serde(skip_serializing_if = "is_false", default)]
    pub dce: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bitmask: Option<u64>,
}

/// `isdataat: [!]pos[, relative]`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IsDataAt {
    pub pos: u64,
    #[serde(skip_serializing_if = "is_false", default)]
    pub negate: bool,
    #[serde(skip_serializing_if = "is_false", default)]
    pub relative: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}
