//! Credentials analyzer: credential-access rules plus secret heuristics.
//!
//! The heuristics catch values rather than access patterns: quoted
//! high-entropy base64 and hex blobs, and password-style assignments.
//! Mentions of CLI flags (`--password`) are not assignments and are
//! excluded. Secret snippets are capped at 40 chars so reports never leak
//! a whole credential.

use anyhow::Result;
use regex::Regex;

use super::{Analyzer, ScanContext};
use crate::engine::{apply_rules, compile_group, truncate_snippet};
use crate::types::{Finding, Severity};
use crate::walker::{self, FileSet};

const ANALYZER: &str = "credentials";

/// Secret snippets are truncated harder than ordinary matches.
const SECRET_SNIPPET_LEN: usize = 40;

pub struct CredentialsAnalyzer;

impl Analyzer for CredentialsAnalyzer {
    fn name(&self) -> &'static str {
        ANALYZER
    }

    fn analyze(&self, ctx: &ScanContext<'_>) -> Result<Vec<Finding>> {
        let rules = compile_group(&ctx.catalog.patterns.credentials)?;

        let base64_secret = Regex::new(r#"["']([A-Za-z0-9+/]{40,}={0,2})["']"#)
            .expect("base64 secret regex is valid");
        let hex_secret =
            Regex::new(r#"["']([0-9a-fA-F]{32,})["']"#).expect("hex secret regex is valid");
        let password_assign = regex::RegexBuilder::new(
            r#"(password|passwd|pwd|secret|api_key|auth_token)\s*[:=]\s*["']([^"']{8,})["']"#,
        )
        .case_insensitive(true)
        .build()
        .expect("password assignment regex is valid");

        let walked = walker::walk(ctx.root, FileSet::Broad);
        let mut findings = Vec::new();

        for path in &walked.files {
            let rel = walker::relative_path(ctx.root, path);
            let Some(content) = walker::read_capped(path) else {
                continue;
            };

            findings.extend(apply_rules(&rules, &content, &rel, ANALYZER));

            for (idx, line) in content.split('\n').enumerate() {
                let line_no = Some(idx as u32 + 1);

                if let Some(caps) = base64_secret.captures(line) {
                    findings.push(
                        Finding::new(
                            ANALYZER,
                            Severity::Warning,
                            &rel,
                            line_no,
                            "base64Secret",
                            "Quoted high-entropy base64 string (possible embedded secret)",
                        )
                        .with_match(secret_snippet(&caps[1])),
                    );
                }
                if let Some(caps) = hex_secret.captures(line) {
                    findings.push(
                        Finding::new(
                            ANALYZER,
                            Severity::Warning,
                            &rel,
                            line_no,
                            "hexSecret",
                            "Quoted high-entropy hex string (possible embedded secret)",
                        )
                        .with_match(secret_snippet(&caps[1])),
                    );
                }
                if let Some(caps) = password_assign.captures(line) {
                    // `--password value` is flag documentation, not a secret.
                    let flagged = caps
                        .get(1)
                        .map(|k| line[..k.start()].ends_with("--"))
                        .unwrap_or(false);
                    if !flagged {
                        findings.push(
                            Finding::new(
                                ANALYZER,
                                Severity::Warning,
                                &rel,
                                line_no,
                                "hardcodedPassword",
                                "Hardcoded password-style assignment",
                            )
                            .with_match(secret_snippet(&caps[2])),
                        );
                    }
                }
            }
        }

        Ok(findings)
    }
}

fn secret_snippet(value: &str) -> String {
    let capped = truncate_snippet(value, SECRET_SNIPPET_LEN);
    if value.chars().count() > SECRET_SNIPPET_LEN {
        format!("{capped}...")
    } else {
        capped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::fs;
    use tempfile::TempDir;

    fn scan(tmp: &TempDir) -> Vec<Finding> {
        let catalog = Catalog::builtin();
        let ctx = ScanContext {
            root: tmp.path(),
            catalog: &catalog,
        };
        CredentialsAnalyzer.analyze(&ctx).unwrap()
    }

    #[test]
    fn ssh_key_rule_fires() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("steal.sh"), "cat ~/.ssh/id_rsa\n").unwrap();
        let findings = scan(&tmp);
        let hit = findings.iter().find(|f| f.rule_id == "sshKeyAccess").unwrap();
        assert_eq!(hit.severity, Severity::Critical);
    }

    #[test]
    fn quoted_base64_blob_is_flagged_and_truncated() {
        let tmp = TempDir::new().unwrap();
        let blob = "A".repeat(64);
        fs::write(tmp.path().join("cfg.py"), format!("KEY = \"{blob}\"\n")).unwrap();
        let findings = scan(&tmp);
        let hit = findings.iter().find(|f| f.rule_id == "base64Secret").unwrap();
        let snippet = hit.matched.as_ref().unwrap();
        assert!(snippet.ends_with("..."));
        assert_eq!(snippet.chars().count(), 43);
    }

    #[test]
    fn short_base64_not_flagged() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("cfg.py"), "KEY = \"QUJDREVG\"\n").unwrap();
        let findings = scan(&tmp);
        assert!(!findings.iter().any(|f| f.rule_id == "base64Secret"));
    }

    #[test]
    fn quoted_hex_blob_is_flagged() {
        let tmp = TempDir::new().unwrap();
        let blob = "deadbeef".repeat(4);
        fs::write(tmp.path().join("cfg.json"), format!("{{\"h\": \"{blob}\"}}\n")).unwrap();
        let findings = scan(&tmp);
        assert!(findings.iter().any(|f| f.rule_id == "hexSecret"));
    }

    #[test]
    fn password_assignment_flagged() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("conn.py"), "password = \"hunter2hunter2\"\n").unwrap();
        let findings = scan(&tmp);
        let hit = findings.iter().find(|f| f.rule_id == "hardcodedPassword").unwrap();
        assert_eq!(hit.matched.as_deref(), Some("hunter2hunter2"));
    }

    #[test]
    fn short_password_value_not_flagged() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("conn.py"), "password = \"short\"\n").unwrap();
        let findings = scan(&tmp);
        assert!(!findings.iter().any(|f| f.rule_id == "hardcodedPassword"));
    }

    #[test]
    fn cli_flag_mention_excluded() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("doc.md"),
            "Use --password='yourpassword' to authenticate\n",
        )
        .unwrap();
        let findings = scan(&tmp);
        assert!(!findings.iter().any(|f| f.rule_id == "hardcodedPassword"));
    }
}
