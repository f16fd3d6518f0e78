//! Rule parse errors

use thiserror::Error;

/// A rule line failed to parse.
///
/// Offsets are byte positions into the rule line being parsed. A failed
/// option never degrades into a generic catch-all: a rule that cannot be
/// fully understood must not be allowed to silently match less (or more)
/// than intended.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleParseError {
    #[error("syntax error at offset {offset}: expected {expected}")]
    SyntaxError { offset: usize, expected: &'static str },

    #[error("unknown rule option keyword `{keyword}` at offset {offset}")]
    UnknownKeyword { keyword: String, offset: usize },

    #[error("invalid `{keyword}` argument: {reason}")]
    InvalidOptionArgument {
        keyword: &'static str,
        reason: String,
    },

    #[error("unrecognized protocol `{name}` at offset {offset}")]
    UnrecognizedProtocol { name: String, offset: usize },

    #[error("invalid action `{0}`")]
    InvalidAction(String),

    #[error("invalid direction `{0}`")]
    InvalidDirection(String),

    #[error("invalid ip address `{0}`")]
    InvalidAddress(String),

    #[error("invalid port spec `{0}`")]
    InvalidPort(String),

    #[error("invalid list: {0}")]
    InvalidList(String),

    #[error("list nesting deeper than two levels")]
    ListDepthOverflow,

    #[error("unterminated list")]
    UnterminatedList,

    #[error("unterminated rule option name at offset {0}")]
    UnterminatedOptionName(usize),

    #[error("unterminated rule option value at offset {0}")]
    UnterminatedOptionValue(usize),

    #[error("missing rule option section `(...)`")]
    MissingOptions,

    #[error("empty rule input")]
    EmptyInput,

    #[error("trailing input after rule body: `{0}`")]
    TrailingInput(String),
}

impl RuleParseError {
    pub(crate) fn arg(keyword: &'static str, reason: impl Into<String>) -> Self {
        RuleParseError::InvalidOptionArgument {
            keyword,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuleParseError>;
