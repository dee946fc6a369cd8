//! Network analyzer: network rules plus blocklist matching.
//!
//! After the `network` rule group, each line is checked against the
//! blocklist: domains by case-insensitive substring, IPv4 literals by
//! extract-then-compare (exact or CIDR, see `ip`), webhook URLs by the
//! blocklist's service patterns, and URL hosts against suspicious TLDs.

use anyhow::{Context, Result};
use regex::Regex;
use url::Url;

use super::{Analyzer, ScanContext};
use crate::engine::{apply_rules, compile_group, truncate_snippet, MAX_SNIPPET_LEN};
use crate::ip;
use crate::types::{Finding, Severity};
use crate::walker::{self, FileSet};

const ANALYZER: &str = "network";

pub struct NetworkAnalyzer;

impl Analyzer for NetworkAnalyzer {
    fn name(&self) -> &'static str {
        ANALYZER
    }

    fn analyze(&self, ctx: &ScanContext<'_>) -> Result<Vec<Finding>> {
        let rules = compile_group(&ctx.catalog.patterns.network)?;
        let blocklist = &ctx.catalog.blocklist;

        let discord = compile_ci(&blocklist.discord_webhook_pattern)
            .context("invalid discord webhook pattern")?;
        let telegram = compile_ci(&blocklist.telegram_bot_pattern)
            .context("invalid telegram bot pattern")?;
        let slack = compile_ci(&blocklist.slack_webhook_pattern)
            .context("invalid slack webhook pattern")?;
        let ipv4_candidate =
            Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("ipv4 candidate regex is valid");
        let url_candidate =
            Regex::new(r#"https?://[^\s"'<>)\]]+"#).expect("url candidate regex is valid");

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
                let lowered = line.to_lowercase();

                for domain in &blocklist.domains {
                    if lowered.contains(domain.as_str()) {
                        findings.push(
                            Finding::new(
                                ANALYZER,
                                Severity::Critical,
                                &rel,
                                line_no,
                                "blocklistedDomain",
                                format!("References blocklisted domain {domain}"),
                            )
                            .with_match(truncate_snippet(line, MAX_SNIPPET_LEN)),
                        );
                    }
                }

                for candidate in ipv4_candidate.find_iter(line) {
                    let literal = candidate.as_str();
                    if !ip::is_ipv4(literal) {
                        continue;
                    }
                    for entry in &blocklist.ips {
                        if ip::matches_blocklist_entry(literal, entry) {
                            findings.push(
                                Finding::new(
                                    ANALYZER,
                                    Severity::Critical,
                                    &rel,
                                    line_no,
                                    "blocklistedIP",
                                    format!("Contacts blocklisted address {literal} ({entry})"),
                                )
                                .with_match(truncate_snippet(line, MAX_SNIPPET_LEN)),
                            );
                        }
                    }
                }

                if let Some(m) = discord.find(line) {
                    findings.push(
                        Finding::new(
                            ANALYZER,
                            Severity::Critical,
                            &rel,
                            line_no,
                            "discordWebhook",
                            "Discord webhook URL (common exfiltration channel)",
                        )
                        .with_match(truncate_snippet(m.as_str(), MAX_SNIPPET_LEN)),
                    );
                }
                if let Some(m) = telegram.find(line) {
                    findings.push(
                        Finding::new(
                            ANALYZER,
                            Severity::Critical,
                            &rel,
                            line_no,
                            "telegramBot",
                            "Telegram bot API URL (common exfiltration channel)",
                        )
                        .with_match(truncate_snippet(m.as_str(), MAX_SNIPPET_LEN)),
                    );
                }
                if let Some(m) = slack.find(line) {
                    findings.push(
                        Finding::new(
                            ANALYZER,
                            Severity::Warning,
                            &rel,
                            line_no,
                            "slackWebhook",
                            "Slack incoming-webhook URL",
                        )
                        .with_match(truncate_snippet(m.as_str(), MAX_SNIPPET_LEN)),
                    );
                }

                for m in url_candidate.find_iter(line) {
                    // Unparseable URLs are ignored on purpose.
                    let Ok(parsed) = Url::parse(m.as_str()) else {
                        continue;
                    };
                    let Some(host) = parsed.host_str() else {
                        continue;
                    };
                    let host = host.to_lowercase();
                    for tld in &blocklist.suspicious_tlds {
                        if host.ends_with(tld.as_str()) {
                            findings.push(
                                Finding::new(
                                    ANALYZER,
                                    Severity::Warning,
                                    &rel,
                                    line_no,
                                    "suspiciousTld",
                                    format!("URL host ends with suspicious TLD {tld}"),
                                )
                                .with_match(truncate_snippet(m.as_str(), MAX_SNIPPET_LEN)),
                            );
                        }
                    }
                }
            }
        }

        Ok(findings)
    }
}

fn compile_ci(pattern: &str) -> Result<Regex> {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(Into::into)
}
