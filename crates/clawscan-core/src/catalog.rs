//! Rule catalog loading.
//!
//! Patterns and the blocklist live in two JSON files (`patterns.json`,
//! `blocklist.json`). A default curated catalog is embedded in the binary;
//! callers may load replacements from a directory. Catalogs are read-only
//! after construction.
//!
//! Regex compilation is deliberately not done here: an invalid pattern must
//! fail only the analyzer that owns the group, so each analyzer compiles
//! its own group at scan time (see `engine::compile_group`).

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::Severity;

/// A single pattern rule: regex source, severity, and human description.
/// Deserialization rejects entries missing any field.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub pattern: String,
    pub severity: Severity,
    pub description: String,
}

/// One category of rules, keyed by rule id. `BTreeMap` keeps rule
/// application order stable across runs.
pub type RuleGroup = BTreeMap<String, RuleSpec>;

/// All pattern rule groups from `patterns.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatternCatalog {
    pub skill_md: RuleGroup,
    pub execution: RuleGroup,
    pub network: RuleGroup,
    pub credentials: RuleGroup,
    pub obfuscation: RuleGroup,
}

/// Curated malicious-infrastructure list from `blocklist.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Blocklist {
    /// Matched against lines by case-insensitive substring.
    pub domains: BTreeSet<String>,
    /// Plain addresses (exact match) or CIDR ranges (containment).
    pub ips: BTreeSet<String>,
    /// Host suffixes like `.tk`; matched against parsed URL hosts.
    pub suspicious_tlds: BTreeSet<String>,
    pub discord_webhook_pattern: String,
    pub telegram_bot_pattern: String,
    pub slack_webhook_pattern: String,
}

/// The loaded rule catalogs. Built once, shared by every analyzer.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub patterns: PatternCatalog,
    pub blocklist: Blocklist,
}

const DEFAULT_PATTERNS: &str = include_str!("../data/patterns.json");
const DEFAULT_BLOCKLIST: &str = include_str!("../data/blocklist.json");

impl Catalog {
    /// The embedded default catalog.
    pub fn builtin() -> Self {
        let patterns: PatternCatalog =
            serde_json::from_str(DEFAULT_PATTERNS).expect("embedded patterns.json is valid");
        let blocklist: Blocklist =
            serde_json::from_str(DEFAULT_BLOCKLIST).expect("embedded blocklist.json is valid");
        Self { patterns, blocklist }
    }

    /// Load `patterns.json` and `blocklist.json` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let patterns_path = dir.join("patterns.json");
        let blocklist_path = dir.join("blocklist.json");

        let patterns_raw = fs::read_to_string(&patterns_path)
            .with_context(|| format!("failed to read {}", patterns_path.display()))?;
        let patterns: PatternCatalog = serde_json::from_str(&patterns_raw)
            .with_context(|| format!("failed to parse {}", patterns_path.display()))?;

        let blocklist_raw = fs::read_to_string(&blocklist_path)
            .with_context(|| format!("failed to read {}", blocklist_path.display()))?;
        let blocklist: Blocklist = serde_json::from_str(&blocklist_raw)
            .with_context(|| format!("failed to parse {}", blocklist_path.display()))?;

        Ok(Self { patterns, blocklist })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = Catalog::builtin();
        assert!(!catalog.patterns.execution.is_empty());
        assert!(!catalog.patterns.skill_md.is_empty());
        assert!(!catalog.blocklist.domains.is_empty());
        assert!(catalog.blocklist.ips.iter().any(|e| e.contains('/')));
    }

    #[test]
    fn builtin_rules_have_valid_regexes() {
        let catalog = Catalog::builtin();
        for group in [
            &catalog.patterns.skill_md,
            &catalog.patterns.execution,
            &catalog.patterns.network,
            &catalog.patterns.credentials,
            &catalog.patterns.obfuscation,
        ] {
            for (id, rule) in group {
                assert!(
                    regex::RegexBuilder::new(&rule.pattern)
                        .case_insensitive(true)
                        .build()
                        .is_ok(),
                    "rule {id} has an invalid pattern"
                );
            }
        }
        for pattern in [
            &catalog.blocklist.discord_webhook_pattern,
            &catalog.blocklist.telegram_bot_pattern,
            &catalog.blocklist.slack_webhook_pattern,
        ] {
            assert!(regex::Regex::new(pattern).is_ok());
        }
    }

    #[test]
    fn combination_rule_ids_present_in_builtin() {
        // The risk aggregator conditions on these ids; the shipped catalog
        // must actually be able to produce them.
        let catalog = Catalog::builtin();
        for id in ["reverseShell", "downloadExecute", "evalExec", "shellExecution", "base64Exec", "cronPersistence", "privEscalation"] {
            assert!(catalog.patterns.execution.contains_key(id), "missing execution rule {id}");
        }
        for id in ["hiddenCommands", "fakePrerequisites", "externalUrls"] {
            assert!(catalog.patterns.skill_md.contains_key(id), "missing skillMd rule {id}");
        }
        for id in ["httpRequests", "rawSockets"] {
            assert!(catalog.patterns.network.contains_key(id), "missing network rule {id}");
        }
        for id in ["sshKeyAccess", "browserData", "apiKeyPatterns", "envFileAccess", "clawbotPaths"] {
            assert!(catalog.patterns.credentials.contains_key(id), "missing credentials rule {id}");
        }
    }

    #[test]
    fn load_from_dir_rejects_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("patterns.json"),
            r#"{"skillMd":{"broken":{"pattern":"x"}},"execution":{},"network":{},"credentials":{},"obfuscation":{}}"#,
        )
        .unwrap();
        fs::write(
            tmp.path().join("blocklist.json"),
            r#"{"domains":[],"ips":[],"suspiciousTlds":[],"discordWebhookPattern":"a","telegramBotPattern":"b","slackWebhookPattern":"c"}"#,
        )
        .unwrap();
        let err = Catalog::load_from_dir(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("patterns.json"));
    }

    #[test]
    fn load_from_dir_roundtrip() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("patterns.json"), DEFAULT_PATTERNS).unwrap();
        fs::write(tmp.path().join("blocklist.json"), DEFAULT_BLOCKLIST).unwrap();
        let catalog = Catalog::load_from_dir(tmp.path()).unwrap();
        assert_eq!(
            catalog.patterns.execution.len(),
            Catalog::builtin().patterns.execution.len()
        );
    }
}
