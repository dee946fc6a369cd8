//! Per-line regex rule application.
//!
//! Compiles a rule group once and runs every rule against every line of a
//! file. Rules are case-insensitive. Multiple rules may fire on the same
//! line; each match becomes its own finding with a 1-based line number and
//! a trimmed snippet capped at 120 chars.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::catalog::RuleGroup;
use crate::types::{Finding, Severity};

/// Maximum length of a match snippet attached to a finding.
pub const MAX_SNIPPET_LEN: usize = 120;

/// A catalog rule with its regex compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub id: String,
    pub regex: Regex,
    pub severity: Severity,
    pub description: String,
}

/// Compile every rule in a group. A single invalid pattern fails the whole
/// group, which surfaces as an error on the owning analyzer only.
pub fn compile_group(group: &RuleGroup) -> Result<Vec<CompiledRule>> {
    group
        .iter()
        .map(|(id, rule)| {
            let regex = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("invalid regex for rule '{id}': {}", rule.pattern))?;
            Ok(CompiledRule {
                id: id.clone(),
                regex,
                severity: rule.severity,
                description: rule.description.clone(),
            })
        })
        .collect()
}

/// Run compiled rules over a file's text. Lines are split on LF only; a
/// trailing CR stays attached to its line.
pub fn apply_rules(
    rules: &[CompiledRule],
    content: &str,
    file: &str,
    analyzer: &str,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (idx, line) in content.split('\n').enumerate() {
        for rule in rules {
            if let Some(m) = rule.regex.find(line) {
                findings.push(
                    Finding::new(
                        analyzer,
                        rule.severity,
                        file,
                        Some(idx as u32 + 1),
                        &rule.id,
                        rule.description.clone(),
                    )
                    .with_match(truncate_snippet(m.as_str(), MAX_SNIPPET_LEN)),
                );
            }
        }
    }
    findings
}

/// Trim and cap a snippet at `max` characters.
pub fn truncate_snippet(s: &str, max: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max {
        trimmed.to_string()
    } else {
        trimmed.chars().take(max).collect()
    }
}
