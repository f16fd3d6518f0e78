//! ICS rule-set container
//!
//! Holds parsed ICS rules indexed by the application protocol their header
//! names, with per-rule enable/disable by sid. Bad lines are collected,
//! never fatal.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use nids_decode::{ApplicationNaiveProtocol, Packet};
use nids_rules::{RuleParseError, RuleProtocol};

use crate::detect::{Detect, DetectResult};
use crate::parser::parse_ics_rule;
use crate::rule::IcsRule;

#[derive(Debug)]
struct Entry {
    rule: IcsRule,
    enabled: bool,
}

/// All loaded ICS rules.
#[derive(Debug, Default)]
pub struct IcsRuleSet {
    entries: Vec<Entry>,
    /// Rule indices keyed by the header's application protocol.
    index: HashMap<ApplicationNaiveProtocol, Vec<usize>>,
    /// Rules whose header protocol is not an application protocol (ip,
    /// tcp, ...); these are checked against every packet.
    general: Vec<usize>,
    errors: Vec<(usize, RuleParseError)>,
}

fn app_protocol_of(protocol: RuleProtocol) -> Option<ApplicationNaiveProtocol> {
    match protocol {
        RuleProtocol::Dns => Some(ApplicationNaiveProtocol::Dns),
        RuleProtocol::Http => Some(ApplicationNaiveProtocol::Http),
        RuleProtocol::Tls => Some(ApplicationNaiveProtocol::Tls),
        RuleProtocol::Modbus => Some(ApplicationNaiveProtocol::Modbus),
        _ => None,
    }
}

impl IcsRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, rule: IcsRule) {
        let idx = self.entries.len();
        match app_protocol_of(rule.header.protocol) {
            Some(app) => self.index.entry(app).or_default().push(idx),
            None => self.general.push(idx),
        }
        self.entries.push(Entry {
            rule,
            enabled: true,
        });
    }

    /// Parse rule text, one rule per line (`#` comments and `\`
    /// continuations as in the generic rule set). Returns how many rules
    /// were added.
    pub fn load_str(&mut self, content: &str) -> usize {
        let mut rule_buffer = String::new();
        let mut start_line = 0;
        let mut added = 0;

        for (idx, line) in content.lines().enumerate() {
            let line_num = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if let Some(stripped) = trimmed.strip_suffix('\\') {
                if rule_buffer.is_empty() {
                    start_line = line_num;
                }
                rule_buffer.push_str(stripped);
                continue;
            }
            let full_rule = if rule_buffer.is_empty() {
                start_line = line_num;
                trimmed.to_string()
            } else {
                rule_buffer.push_str(trimmed);
                std::mem::take(&mut rule_buffer)
            };

            match parse_ics_rule(&full_rule) {
                Ok(rule) => {
                    self.insert(rule);
                    added += 1;
                }
                Err(err) => {
                    tracing::warn!(line = start_line, error = %err, "skipping unparseable ics rule");
                    self.errors.push((start_line, err));
                }
            }
        }
        added
    }

    /// Load rules from a file on disk.
    pub fn load_file(&mut self, path: &Path) -> io::Result<usize> {
        let content = fs::read_to_string(path).map_err(|err| {
            tracing::error!(path = %path.display(), error = %err, "failed to read ics rule file");
            err
        })?;
        Ok(self.load_str(&content))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &IcsRule> {
        self.entries.iter().map(|e| &e.rule)
    }

    pub fn errors(&self) -> &[(usize, RuleParseError)] {
        &self.errors
    }

    fn set_enabled(&mut self, sid: u64, enabled: bool) -> bool {
        let mut found = false;
        for entry in &mut self.entries {
            if entry.rule.sid() == Some(sid) {
                entry.enabled = enabled;
                found = true;
            }
        }
        found
    }

    /// Re-enable rules with this sid. Returns whether any rule matched.
    pub fn enable(&mut self, sid: u64) -> bool {
        self.set_enabled(sid, true)
    }

    /// Disable rules with this sid without removing them.
    pub fn disable(&mut self, sid: u64) -> bool {
        self.set_enabled(sid, false)
    }

    fn candidate_indices<'s>(&'s self, packet: &Packet<'_>) -> impl Iterator<Item = usize> + 's {
        let indexed = packet
            .app_protocol()
            .and_then(|app| self.index.get(&app))
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        self.general.iter().chain(indexed.iter()).copied()
    }

    /// First enabled rule that applies to the packet wins.
    pub fn detect(&self, packet: &Packet<'_>) -> DetectResult {
        for idx in self.candidate_indices(packet) {
            let entry = &self.entries[idx];
            if !entry.enabled {
                continue;
            }
            if let DetectResult::Hit(action) = entry.rule.detect(packet) {
                return DetectResult::Hit(action);
            }
        }
        DetectResult::Miss
    }

    /// Every enabled rule that applies to the packet.
    pub fn matches<'s>(&'s self, packet: &Packet<'_>) -> Vec<&'s IcsRule> {
        self.candidate_indices(packet)
            .filter_map(|idx| {
                let entry = &self.entries[idx];
                if entry.enabled
                    && matches!(entry.rule.detect(packet), DetectResult::Hit(_))
                {
                    Some(&entry.rule)
                } else {
                    None
                }
            })
            .collect()
    }
}
