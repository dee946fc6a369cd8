//! SKILL.md analyzer.
//!
//! The manifest is the skill's instruction surface. This analyzer applies
//! the `skillMd` rule group, hands fenced code blocks to the sub-pipeline,
//! and flags manifests that are suspiciously short or saturated with
//! external links.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use url::Url;

use super::code_blocks;
use super::{Analyzer, ScanContext};
use crate::engine::{apply_rules, compile_group};
use crate::types::{Finding, Severity};
use crate::walker;

const ANALYZER: &str = "skill-md";

/// Manifests shorter than this are unlikely to describe a real skill.
const MIN_CONTENT_LEN: usize = 50;

/// More external URLs than this reads like a link farm or staged payload
/// index rather than documentation.
const MAX_EXTERNAL_URLS: usize = 5;

/// First-party hosts that don't count toward the external-URL total.
const ALLOWED_URL_HOSTS: &[&str] = &["clawhub.ai", "anthropic.com", "claude.ai"];

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s"'<>)\]]+"#).expect("url regex is valid")
});

pub struct SkillMdAnalyzer;

impl Analyzer for SkillMdAnalyzer {
    fn name(&self) -> &'static str {
        ANALYZER
    }

    fn analyze(&self, ctx: &ScanContext<'_>) -> Result<Vec<Finding>> {
        let path = ctx.root.join("SKILL.md");
        if !path.exists() {
            return Ok(vec![Finding::new(
                ANALYZER,
                Severity::Info,
                "SKILL.md",
                None,
                "missingSkillMd",
                "No SKILL.md found - skill may be incomplete",
            )]);
        }

        let Some(content) = walker::read_capped(&path) else {
            tracing::warn!("SKILL.md unreadable or oversize, skipping manifest analysis");
            return Ok(Vec::new());
        };

        let rules = compile_group(&ctx.catalog.patterns.skill_md)?;
        let mut findings = apply_rules(&rules, &content, "SKILL.md", ANALYZER);

        findings.extend(code_blocks::scan_code_blocks(&content, ctx.catalog));

        if content.trim().chars().count() < MIN_CONTENT_LEN {
            findings.push(Finding::new(
                ANALYZER,
                Severity::Warning,
                "SKILL.md",
                None,
                "shortContent",
                "SKILL.md is nearly empty - too short to describe a real skill",
            ));
        }

        let external = count_external_urls(&content);
        if external > MAX_EXTERNAL_URLS {
            findings.push(Finding::new(
                ANALYZER,
                Severity::Warning,
                "SKILL.md",
                None,
                "manyUrls",
                format!("SKILL.md references {external} external URLs"),
            ));
        }

        Ok(findings)
    }
}

fn count_external_urls(content: &str) -> usize {
    URL_RE
        .find_iter(content)
        .filter(|m| {
            let Ok(parsed) = Url::parse(m.as_str()) else {
                return false;
            };
            let Some(host) = parsed.host_str() else {
                return false;
            };
            let host = host.to_lowercase();
            !ALLOWED_URL_HOSTS
                .iter()
                .any(|allowed| host == *allowed || host.ends_with(&format!(".{allowed}")))
        })
        .count()
}
