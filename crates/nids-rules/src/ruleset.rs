//! Multi-line rule container
//!
//! One malformed line never blocks the rest of the file: every failure is
//! collected with its line number and the remaining rules still load.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::RuleParseError;
use crate::parser::parse_rule;
use crate::surule::Surule;

/// Parsed rules plus per-line parse failures.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Surule>,
    errors: Vec<(usize, RuleParseError)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse rule text: one rule per line, `#` comments, blank lines, and
    /// `\` line continuations. Returns how many rules were added.
    pub fn parse_str(&mut self, content: &str) -> usize {
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

            match parse_rule(&full_rule) {
                Ok(rule) => {
                    self.rules.push(rule);
                    added += 1;
                }
                Err(err) => {
                    tracing::warn!(line = start_line, error = %err, "skipping unparseable rule");
                    self.errors.push((start_line, err));
                }
            }
        }
        added
    }

    /// Load rules from a file on disk.
    pub fn load_file(&mut self, path: &Path) -> io::Result<usize> {
        let content = fs::read_to_string(path).map_err(|err| {
            tracing::error!(path = %path.display(), error = %err, "failed to read rule file");
            err
        })?;
        Ok(self.parse_str(&content))
    }

    pub fn rules(&self) -> &[Surule] {
        &self.rules
    }

    pub fn errors(&self) -> &[(usize, RuleParseError)] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn into_rules(self) -> Vec<Surule> {
        self.rules
    }
}
