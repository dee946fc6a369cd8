//! Obfuscation analyzer: obfuscation rules plus minification heuristics.
//!
//! File-level heuristics: a single very long line (minified or packed
//! payloads), `_0x`-style identifiers from the javascript-obfuscator tool
//! family, and literal obfuscator signatures.

use anyhow::Result;
use regex::Regex;

use super::{Analyzer, ScanContext};
use crate::engine::{apply_rules, compile_group};
use crate::types::{Finding, Severity};
use crate::walker::{self, FileSet};

const ANALYZER: &str = "obfuscation";

const LONG_LINE_THRESHOLD: usize = 500;

/// More than this many `_0x...` identifiers marks obfuscator output.
const OBFUSCATED_IDENT_THRESHOLD: usize = 3;

const TOOL_SIGNATURES: &[&str] = &[
    "javascript-obfuscator",
    "jsfuck",
    "jjencode",
    "aaencode",
    "pyarmor",
    "pyobfuscate",
];

pub struct ObfuscationAnalyzer;

impl Analyzer for ObfuscationAnalyzer {
    fn name(&self) -> &'static str {
        ANALYZER
    }

    fn analyze(&self, ctx: &ScanContext<'_>) -> Result<Vec<Finding>> {
        let rules = compile_group(&ctx.catalog.patterns.obfuscation)?;
        let obf_ident = Regex::new(r"_0x[0-9a-f]+").expect("obfuscated ident regex is valid");

        let walked = walker::walk(ctx.root, FileSet::Broad);
        let mut findings = Vec::new();

        for path in &walked.files {
            let rel = walker::relative_path(ctx.root, path);
            let Some(content) = walker::read_capped(path) else {
                continue;
            };
            let is_json = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"));

            findings.extend(apply_rules(&rules, &content, &rel, ANALYZER));

            // Long JSON lines are normal; everything else over the threshold
            // looks like minified or packed code. First offender only.
            if !is_json {
                if let Some((idx, _)) = content
                    .split('\n')
                    .enumerate()
                    .find(|(_, line)| line.chars().count() > LONG_LINE_THRESHOLD)
                {
                    findings.push(Finding::new(
                        ANALYZER,
                        Severity::Warning,
                        &rel,
                        Some(idx as u32 + 1),
                        "longLine",
                        format!("Line exceeds {LONG_LINE_THRESHOLD} chars (minified or packed code)"),
                    ));
                }
            }

            let ident_count = obf_ident.find_iter(&content).count();
            if ident_count > OBFUSCATED_IDENT_THRESHOLD {
                let line = first_match_line(&content, &obf_ident);
                findings.push(Finding::new(
                    ANALYZER,
                    Severity::Critical,
                    &rel,
                    line,
                    "jsObfuscator",
                    format!("{ident_count} _0x-style identifiers (javascript-obfuscator output)"),
                ));
            }

            let lowered = content.to_lowercase();
            for signature in TOOL_SIGNATURES {
                if lowered.contains(signature) {
                    let line = lowered
                        .split('\n')
                        .position(|l| l.contains(signature))
                        .map(|idx| idx as u32 + 1);
                    findings.push(Finding::new(
                        ANALYZER,
                        Severity::Critical,
                        &rel,
                        line,
                        "obfuscationTool",
                        format!("Obfuscation tool signature: {signature}"),
                    ));
                }
            }
        }

        Ok(findings)
    }
}

fn first_match_line(content: &str, regex: &Regex) -> Option<u32> {
    content
        .split('\n')
        .position(|line| regex.is_match(line))
        .map(|idx| idx as u32 + 1)
}
