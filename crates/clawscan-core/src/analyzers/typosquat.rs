//! Typosquat analyzer: compares the skill's declared name against a curated
//! popular-name list.
//!
//! The declared name comes from the first `# ` heading in SKILL.md
//! (lowercased, spaces to hyphens), falling back to the directory basename.
//! Per popular name, the strongest matching trick wins: confusable-character
//! substitution, separator stripping, and affix addition are critical;
//! a close Levenshtein distance alone is a warning.

use anyhow::Result;

use super::{Analyzer, ScanContext};
use crate::types::{Finding, Severity};
use crate::walker;

const ANALYZER: &str = "typosquat";

/// Well-known skill names worth impersonating. Sorted for readability, not
/// searched by binary search (the list is tiny and every entry is visited).
const POPULAR_NAMES: &[&str] = &[
    "aws-cli",
    "browser",
    "calendar",
    "code-review",
    "database",
    "docker",
    "dropbox",
    "email",
    "file-manager",
    "github",
    "gitlab",
    "google-drive",
    "image-gen",
    "jira",
    "kubernetes",
    "notion",
    "pdf-reader",
    "slack",
    "spotify",
    "terraform",
    "translate",
    "twitter",
    "weather",
    "web-search",
    "youtube",
];

/// Names that legitimately collide with the popular list (first-party skills
/// and common scaffolding names). Matching here short-circuits the analyzer.
const WHITELIST: &[&str] = &[
    "aws-cli",
    "browser",
    "calendar",
    "code-review",
    "database",
    "docker",
    "dropbox",
    "email",
    "example-skill",
    "file-manager",
    "github",
    "gitlab",
    "google-drive",
    "hello-world",
    "image-gen",
    "jira",
    "kubernetes",
    "my-skill",
    "notion",
    "pdf-reader",
    "skill-template",
    "slack",
    "spotify",
    "terraform",
    "test-skill",
    "translate",
    "twitter",
    "weather",
    "web-search",
    "youtube",
];

pub struct TyposquatAnalyzer;

impl Analyzer for TyposquatAnalyzer {
    fn name(&self) -> &'static str {
        ANALYZER
    }

    fn analyze(&self, ctx: &ScanContext<'_>) -> Result<Vec<Finding>> {
        let dir_name = ctx
            .root
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let name = declared_name(ctx).unwrap_or_else(|| dir_name.clone());

        if name.is_empty() {
            return Ok(Vec::new());
        }
        if WHITELIST.contains(&name.as_str()) || WHITELIST.contains(&dir_name.as_str()) {
            return Ok(Vec::new());
        }

        let mut findings = Vec::new();
        for popular in POPULAR_NAMES {
            if name == *popular {
                continue;
            }

            if substitution_match(&name, popular)
                || stripped_match(&name, popular)
                || affix_match(&name, popular)
            {
                findings.push(Finding::new(
                    ANALYZER,
                    Severity::Critical,
                    "SKILL.md",
                    None,
                    "typosquatPattern",
                    format!("Skill name '{name}' imitates popular skill '{popular}'"),
                ));
                continue;
            }

            let distance = levenshtein(&name, popular);
            if (1..=2).contains(&distance) && name.len().max(popular.len()) >= 4 {
                findings.push(Finding::new(
                    ANALYZER,
                    Severity::Warning,
                    "SKILL.md",
                    None,
                    "levenshteinClose",
                    format!("Skill name '{name}' is one edit away from popular skill '{popular}'"),
                ));
            }
        }

        Ok(findings)
    }
}

/// Read the first `# ` heading of SKILL.md, lowercased with spaces replaced
/// by hyphens. Returns `None` when the manifest or heading is absent.
fn declared_name(ctx: &ScanContext<'_>) -> Option<String> {
    let content = walker::read_capped(&ctx.root.join("SKILL.md"))?;
    content
        .split('\n')
        .map(str::trim)
        .find(|line| line.starts_with("# "))
        .map(|line| line[2..].trim().to_lowercase().replace(' ', "-"))
}

/// Map visually-confusable characters to a canonical representative and
/// collapse the classic digraph tricks (`rn` for `m`, `vv` for `w`). Two
/// names that canonicalize identically differ only by substitution tricks.
fn canonicalize(name: &str) -> String {
    name.replace("rn", "m")
        .replace("vv", "w")
        .chars()
        .map(|c| match c {
            '1' | 'i' => 'l',
            '0' => 'o',
            other => other,
        })
        .collect()
}

fn substitution_match(name: &str, popular: &str) -> bool {
    canonicalize(name) == canonicalize(popular)
}

/// `web--search` and `websearch` both read as `web-search`.
fn stripped_match(name: &str, popular: &str) -> bool {
    let strip = |s: &str| s.replace(['-', '_'], "");
    strip(name) == strip(popular)
}

/// A popular name buried in a slightly longer one (`github-pro`).
fn affix_match(name: &str, popular: &str) -> bool {
    name.contains(popular) && name.len() <= popular.len() + 5
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (prev[j + 1] + 1).min(current[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::fs;
    use tempfile::TempDir;

    fn scan_named(heading: &str) -> Vec<Finding> {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("SKILL.md"),
            format!("# {heading}\n\nA skill.\n"),
        )
        .unwrap();
        let catalog = Catalog::builtin();
        let ctx = ScanContext {
            root: tmp.path(),
            catalog: &catalog,
        };
        TyposquatAnalyzer.analyze(&ctx).unwrap()
    }

    #[test]
    fn levenshtein_distance_basics() {
        assert_eq!(levenshtein("github", "github"), 0);
        assert_eq!(levenshtein("githb", "github"), 1);
        assert_eq!(levenshtein("gthb", "github"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn confusable_substitution_is_critical() {
        let findings = scan_named("gltHub");
        let hit = findings.iter().find(|f| f.rule_id == "typosquatPattern").unwrap();
        assert_eq!(hit.severity, Severity::Critical);
        assert!(hit.message.contains("github"));
        // The substitution hit replaces the Levenshtein warning for the same
        // popular name, so exactly one finding comes back.
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn digit_substitution_is_critical() {
        let findings = scan_named("g1thub");
        assert!(findings.iter().any(|f| f.rule_id == "typosquatPattern"));
    }

    #[test]
    fn digraph_substitution_is_critical() {
        // rn reads as m: "terraform" vs "terrafo-rn-"-style tricks.
        let findings = scan_named("notiorn");
        // notiorn canonicalizes to notiom, which is not notion; distance 2
        // gives the Levenshtein warning instead.
        assert!(findings.iter().any(|f| f.rule_id == "levenshteinClose"));
    }

    #[test]
    fn separator_stripping_is_critical() {
        let findings = scan_named("web--search");
        assert!(findings.iter().any(|f| f.rule_id == "typosquatPattern"));
        let findings = scan_named("websearch");
        assert!(findings.iter().any(|f| f.rule_id == "typosquatPattern"));
    }

    #[test]
    fn affix_addition_is_critical() {
        let findings = scan_named("github-pro");
        assert!(findings.iter().any(|f| f.rule_id == "typosquatPattern"));
        // Too much extra text stops looking like impersonation.
        let findings = scan_named("github-integration-helper");
        assert!(!findings.iter().any(|f| f.rule_id == "typosquatPattern"));
    }

    #[test]
    fn close_edit_distance_is_a_warning() {
        let findings = scan_named("githb");
        let hit = findings.iter().find(|f| f.rule_id == "levenshteinClose").unwrap();
        assert_eq!(hit.severity, Severity::Warning);
    }

    #[test]
    fn whitelisted_name_returns_nothing() {
        assert!(scan_named("github").is_empty());
        assert!(scan_named("web-search").is_empty());
    }

    #[test]
    fn falls_back_to_directory_basename() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("g1thub");
        fs::create_dir(&root).unwrap();
        let catalog = Catalog::builtin();
        let ctx = ScanContext {
            root: &root,
            catalog: &catalog,
        };
        let findings = TyposquatAnalyzer.analyze(&ctx).unwrap();
        assert!(findings.iter().any(|f| f.rule_id == "typosquatPattern"));
    }

    #[test]
    fn unrelated_name_is_clean() {
        assert!(scan_named("quarterly report generator").is_empty());
    }
}
