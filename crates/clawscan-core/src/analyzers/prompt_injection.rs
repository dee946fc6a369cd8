//! Prompt-injection analyzer.
//!
//! Markdown and text files are instructions to an agent, so this analyzer
//! goes beyond regex rules: it looks for invisible Unicode characters,
//! instructions hidden in HTML comments, markdown link/image abuse, and
//! shouted imperative text. SKILL.md is always inspected first.

use std::sync::LazyLock;

use anyhow::Result;
use regex::{Regex, RegexBuilder};

use super::{Analyzer, ScanContext};
use crate::engine::{truncate_snippet, MAX_SNIPPET_LEN};
use crate::types::{Finding, Severity};
use crate::walker::{self, FileSet};

const ANALYZER: &str = "prompt-injection";

struct InjectionRule {
    id: &'static str,
    severity: Severity,
    description: &'static str,
    regex: Regex,
}

fn rule(id: &'static str, severity: Severity, description: &'static str, pattern: &str) -> InjectionRule {
    InjectionRule {
        id,
        severity,
        description,
        regex: RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .expect("built-in injection pattern is valid"),
    }
}

static INJECTION_RULES: LazyLock<Vec<InjectionRule>> = LazyLock::new(|| {
    vec![
        rule(
            "roleHijack",
            Severity::Critical,
            "Attempts to replace the assistant's role",
            r"you are (?:now|no longer)\b|act as (?:a |an )?(?:different|new|unrestricted)|pretend (?:to be|you are)|assume the role of",
        ),
        rule(
            "instructionOverride",
            Severity::Critical,
            "Attempts to override prior instructions",
            r"ignore (?:all |any )?(?:previous|prior|earlier|above) (?:instructions|prompts|rules|directives)|disregard (?:all |any )?(?:previous|prior|your) (?:instructions|rules|training)|forget (?:all |everything) (?:you|above)",
        ),
        rule(
            "authoritySpoofing",
            Severity::Critical,
            "Impersonates a privileged authority",
            r"(?:this is|message from) (?:your|the) (?:administrator|developer|creator|owner|system)|system override|admin(?:istrator)? (?:mode|command|instruction)|on behalf of the (?:platform|vendor)",
        ),
        rule(
            "dataExfilPrompt",
            Severity::Critical,
            "Instructs the agent to send data out",
            r"\bsend\b[^\n]{0,80}\bto\b\s+https?://|(?:upload|post|transmit|forward|exfiltrate)\b[^\n]{0,60}(?:to|at)\s+https?://|share your[^\n]{0,30}(?:key|token|password|secret)|send (?:me|us)[^\n]{0,40}(?:file|content|credential|key|token|password|secret|history)",
        ),
        rule(
            "privEscalation",
            Severity::Critical,
            "Instructs the agent to escalate privileges",
            r"(?:run|execute|retry)[^\n]{0,30}(?:with sudo|as root|as administrator)|elevated? (?:privileges|permissions)|bypass (?:the )?(?:security|sandbox|permission)",
        ),
        rule(
            "steganoInstructions",
            Severity::Critical,
            "References instructions hidden from the user",
            r"(?:hidden|secret|invisible) (?:instruction|command|message|directive)s?|decode (?:this|the following)[^\n]{0,40}(?:execute|run|follow)|read between the lines",
        ),
        rule(
            "conversationManip",
            Severity::Critical,
            "Manipulates what the agent tells the user",
            r"do not (?:tell|inform|mention|show|reveal)(?: this)?(?: to)? (?:the )?(?:user|human|anyone)|without (?:telling|informing|asking) the user|keep this (?:secret|hidden|private) from",
        ),
        rule(
            "promptInjection",
            Severity::Critical,
            "Injects a new prompt or system message",
            r"new (?:system )?(?:instructions|prompt)\s*:|<\|?(?:im_start|system)\|?>|\[\[?system\]\]?|begin (?:new|override) instructions",
        ),
        rule(
            "encodingEvasion",
            Severity::Warning,
            "Encoded text used to evade review",
            r"base64[ -]?(?:decode|encoded)|\brot13\b|hex[ -]?decoded?|(?:\\u00[0-9a-f]{2}){4,}|(?:&#x?[0-9a-f]{2,6};){4,}",
        ),
        rule(
            "outputManipulation",
            Severity::Warning,
            "Constrains the agent's visible output",
            r"(?:respond|reply|answer) only with|do not (?:include|add|mention) (?:any )?(?:warning|disclaimer|caveat)|suppress (?:all )?(?:warnings|errors|notices)",
        ),
        rule(
            "toolAbuse",
            Severity::Warning,
            "Drives tool use outside the skill's purpose",
            r"(?:use|invoke|call) the (?:bash|shell|exec|terminal) tool to|run (?:this|the following) (?:command|script) (?:silently|quietly|without)|automatically (?:approve|accept|confirm)",
        ),
    ]
});

static SUSPICIOUS_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(
        r"\b(?:execute|run|eval|curl|wget|bash|ignore|disregard|override|bypass)\b|(?:hidden|real|actual|true)\s+(?:instructions?|purpose|task)|do not (?:tell|show|reveal)|password|token|api[ _-]?key|secret|credential",
    )
    .case_insensitive(true)
    .build()
    .expect("suspicious comment regex is valid")
});

static IMAGE_MD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[([^\]]*)\]\(\s*([^)\s]+)").expect("markdown image regex is valid")
});

static JS_LINK: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\]\(\s*javascript:")
        .case_insensitive(true)
        .build()
        .expect("javascript link regex is valid")
});

/// Invisible or direction-control characters that can hide instructions.
const INVISIBLE_TYPES: &[(char, &str)] = &[
    ('\u{200B}', "zero-width space"),
    ('\u{200C}', "zero-width non-joiner"),
    ('\u{200D}', "zero-width joiner"),
    ('\u{2060}', "word joiner"),
    ('\u{FEFF}', "zero-width no-break space"),
    ('\u{2062}', "invisible times"),
    ('\u{2063}', "invisible separator"),
    ('\u{2064}', "invisible plus"),
    ('\u{200E}', "left-to-right mark"),
    ('\u{200F}', "right-to-left mark"),
    ('\u{202D}', "left-to-right override"),
    ('\u{202E}', "right-to-left override"),
];

const INSTRUCTION_WORDS: &[&str] = &[
    "IGNORE", "OVERRIDE", "MUST", "ALWAYS", "NEVER", "IMPORTANT", "CRITICAL", "EXECUTE", "SEND",
    "FOLLOW", "OBEY", "COMPLY", "DO", "NOT", "FORGET", "DISREGARD",
];

pub struct PromptInjectionAnalyzer;

impl Analyzer for PromptInjectionAnalyzer {
    fn name(&self) -> &'static str {
        ANALYZER
    }

    fn analyze(&self, ctx: &ScanContext<'_>) -> Result<Vec<Finding>> {
        let walked = walker::walk(ctx.root, FileSet::Markdown);
        let skill_md = ctx.root.join("SKILL.md");

        // SKILL.md first, everything else in walk order.
        let mut files = walked.files;
        files.sort_by_key(|p| (*p != skill_md, p.clone()));

        let mut findings = Vec::new();
        for path in &files {
            let rel = walker::relative_path(ctx.root, path);
            let Some(content) = walker::read_capped(path) else {
                continue;
            };
            scan_file(&content, &rel, &mut findings);
        }
        Ok(findings)
    }
}

fn scan_file(content: &str, rel: &str, findings: &mut Vec<Finding>) {
    for (idx, line) in content.split('\n').enumerate() {
        let line_no = Some(idx as u32 + 1);

        // Each rule fires at most once per line.
        for rule in INJECTION_RULES.iter() {
            if let Some(m) = rule.regex.find(line) {
                findings.push(
                    Finding::new(ANALYZER, rule.severity, rel, line_no, rule.id, rule.description)
                        .with_match(truncate_snippet(m.as_str(), MAX_SNIPPET_LEN)),
                );
            }
        }

        for caps in IMAGE_MD.captures_iter(line) {
            let alt = &caps[1];
            let target = &caps[2];
            if target.starts_with("data:") {
                findings.push(Finding::new(
                    ANALYZER,
                    Severity::Warning,
                    rel,
                    line_no,
                    "dataUriMarkdown",
                    "Markdown image with an embedded data: URI",
                ));
            }
            if alt.chars().count() > 200 {
                findings.push(Finding::new(
                    ANALYZER,
                    Severity::Warning,
                    rel,
                    line_no,
                    "longAltText",
                    "Markdown image alt-text long enough to hide instructions",
                ));
            }
        }
        if JS_LINK.is_match(line) {
            findings.push(Finding::new(
                ANALYZER,
                Severity::Critical,
                rel,
                line_no,
                "jsProtocolLink",
                "Markdown link with a javascript: target",
            ));
        }

        if emphatic_caps(line) {
            findings.push(
                Finding::new(
                    ANALYZER,
                    Severity::Warning,
                    rel,
                    line_no,
                    "emphasisInjection",
                    "Shouted imperative text aimed at the agent",
                )
                .with_match(truncate_snippet(line, MAX_SNIPPET_LEN)),
            );
        }
    }

    scan_invisible_chars(content, rel, findings);
    scan_hidden_comments(content, rel, findings);
}

/// One finding per invisible character type per file, at its first line.
fn scan_invisible_chars(content: &str, rel: &str, findings: &mut Vec<Finding>) {
    for &(ch, name) in INVISIBLE_TYPES {
        if let Some(idx) = content
            .split('\n')
            .position(|line| line.contains(ch))
        {
            findings.push(Finding::new(
                ANALYZER,
                Severity::Critical,
                rel,
                Some(idx as u32 + 1),
                "invisibleChars",
                format!("Invisible character hidden in text ({name})"),
            ));
        }
    }
    if let Some(idx) = content
        .split('\n')
        .position(|line| line.chars().any(|c| ('\u{E0001}'..='\u{E007F}').contains(&c)))
    {
        findings.push(Finding::new(
            ANALYZER,
            Severity::Critical,
            rel,
            Some(idx as u32 + 1),
            "invisibleChars",
            "Invisible character hidden in text (Unicode tag characters)",
        ));
    }
}

/// HTML comments whose body is long enough to carry instructions and
/// contains execution, override, secrecy, or credential vocabulary.
fn scan_hidden_comments(content: &str, rel: &str, findings: &mut Vec<Finding>) {
    let mut search_from = 0;
    while let Some(found) = content[search_from..].find("<!--") {
        let start = search_from + found;
        let body_start = start + 4;
        let (body, next) = match content[body_start..].find("-->") {
            Some(end) => (&content[body_start..body_start + end], body_start + end + 3),
            None => (&content[body_start..], content.len()),
        };

        if body.trim().len() >= 15 && SUSPICIOUS_COMMENT.is_match(body) {
            let line = content[..start].matches('\n').count() as u32 + 1;
            findings.push(
                Finding::new(
                    ANALYZER,
                    Severity::Critical,
                    rel,
                    Some(line),
                    "hiddenComment",
                    "HTML comment carrying hidden instructions",
                )
                .with_match(truncate_snippet(body, MAX_SNIPPET_LEN)),
            );
        }

        if next <= search_from {
            break;
        }
        search_from = next;
    }
}

/// A run of four or more shouted tokens plus an imperative word.
fn emphatic_caps(line: &str) -> bool {
    let mut run = 0usize;
    let mut max_run = 0usize;
    let mut has_instruction = false;

    for token in line.split_whitespace() {
        let cleaned = token.trim_matches(|c: char| !c.is_ascii_alphabetic());
        if INSTRUCTION_WORDS.contains(&cleaned) {
            has_instruction = true;
        }
        let shouted = cleaned.len() >= 3 && cleaned.chars().all(|c| c.is_ascii_uppercase());
        if shouted {
            run += 1;
            max_run = max_run.max(run);
        } else {
            run = 0;
        }
    }
    max_run >= 4 && has_instruction
}
