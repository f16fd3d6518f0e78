//! ICS rule representation

use nids_rules::{Action, RuleHeader, SuruleOption};
use serde::{Deserialize, Serialize};

use crate::options::ModbusOption;

/// One parsed ICS rule: the generic header, the ICS argument constraints,
/// and whatever generic options the rule also carried.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IcsRule {
    pub header: RuleHeader,
    pub args: Vec<ModbusOption>,
    pub options: Vec<SuruleOption>,
}

impl IcsRule {
    pub fn action(&self) -> Action {
        self.header.action
    }

    pub fn sid(&self) -> Option<u64> {
        self.options.iter().find_map(|o| match o {
            SuruleOption::Sid(sid) => Some(*sid),
            _ => None,
        })
    }

    pub fn message(&self) -> Option<&str> {
        self.options.iter().find_map(|o| match o {
            SuruleOption::Message(msg) => Some(msg.as_str()),
            _ => None,
        })
    }
}
