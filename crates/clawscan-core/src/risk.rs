//! Risk aggregation.
//!
//! Scoring runs in two stages. Stage A is linear: every finding contributes
//! its severity weight, halved (integer floor) when the manifest reads like
//! a legitimate CLI wrapper. Stage B looks only at which rule ids are
//! present and adds combination bonuses; co-occurring capabilities (steal
//! credentials AND talk to a webhook) are what separate malware from noisy
//! but benign tooling. The final score is capped at 100 and maps onto the
//! SAFE / WARNING / DANGEROUS verdict.

use std::collections::HashSet;

use crate::types::{Finding, Risk, Severity};

const CRITICAL_WEIGHT: u32 = 10;
const WARNING_WEIGHT: u32 = 2;

/// Vocabulary that marks a manifest as a wrapper around an existing
/// command-line tool. Two distinct indicators are enough.
const CLI_INDICATORS: &[&str] = &[
    "cli",
    "command-line",
    "command line",
    "wrapper",
    "terminal",
    "shell command",
    "executes",
    "runs command",
    "run command",
    "spawns",
    "child_process",
    "subprocess",
    "exec(",
    "execsync",
    "spawn(",
    "tool that",
    "tool for",
    "curl",
    "calls the",
];

/// Detect the CLI-wrapper context from the manifest text. Gameable by
/// sprinkling CLI vocabulary, which is why it only attenuates Stage A and
/// never the combination bonuses.
pub fn is_cli_wrapper(skill_md_text: &str) -> bool {
    let lowered = skill_md_text.to_lowercase();
    CLI_INDICATORS
        .iter()
        .filter(|indicator| lowered.contains(*indicator))
        .count()
        >= 2
}

/// Compute the final risk from the complete finding set.
pub fn aggregate(findings: &[Finding], cli_wrapper: bool) -> Risk {
    let mut stage_a: u32 = findings
        .iter()
        .map(|f| match f.severity {
            Severity::Critical => CRITICAL_WEIGHT,
            Severity::Warning => WARNING_WEIGHT,
            Severity::Info => 0,
        })
        .sum();
    if cli_wrapper {
        stage_a /= 2;
    }

    let ids: HashSet<&str> = findings.iter().map(|f| f.rule_id.as_str()).collect();
    let stage_b = combination_bonuses(&ids);

    Risk::from_score((stage_a + stage_b).min(100))
}

fn combination_bonuses(ids: &HashSet<&str>) -> u32 {
    let has = |id: &str| ids.contains(id);
    let any = |group: &[&str]| group.iter().any(|id| ids.contains(id));

    let exec = any(&["evalExec", "shellExecution"]);
    let prompt_injection = any(&[
        "promptInjection",
        "roleHijack",
        "instructionOverride",
        "authoritySpoofing",
        "steganoInstructions",
        "conversationManip",
    ]);
    let cred_access = any(&["sshKeyAccess", "browserData", "apiKeyPatterns"]);
    let env_access = any(&["envFileAccess", "clawbotPaths"]);
    let webhook = any(&["discordWebhook", "telegramBot", "slackWebhook"]);
    let network = any(&["httpRequests", "rawSockets"]);
    let obfuscation = any(&["jsObfuscator", "obfuscationTool", "longLine"]);
    let blocklisted_domain = has("blocklistedDomain");
    let blocklisted_ip = has("blocklistedIP");

    let mut bonus = 0;

    if cred_access && (webhook || blocklisted_domain || blocklisted_ip) {
        bonus += 60;
    }
    if has("reverseShell") {
        bonus += 60;
    }
    if has("downloadExecute") {
        bonus += 50;
    }
    if prompt_injection {
        bonus += 50;
    }
    if has("dataExfilPrompt") {
        bonus += 50;
    }
    if has("hiddenCommands") {
        bonus += 50;
    }
    if has("invisibleChars") {
        bonus += 40;
    }
    if has("privEscalation") {
        bonus += 40;
    }
    if has("fakePrerequisites") {
        bonus += if has("externalUrls") { 40 } else { 25 };
    }
    if has("hiddenComment") {
        bonus += 35;
    }
    if obfuscation && exec {
        bonus += 35;
    }
    if webhook && env_access {
        bonus += 35;
    }
    if blocklisted_domain {
        bonus += 30;
    }
    if blocklisted_ip {
        bonus += 30;
    }
    if has("cronPersistence") {
        bonus += 30;
    }
    if prompt_injection && has("dataExfilPrompt") {
        bonus += 20;
    }
    if cred_access && network && !webhook && !blocklisted_domain {
        bonus += 15;
    }
    if has("base64Exec") && exec {
        bonus += 15;
    }
    if obfuscation && !exec {
        bonus += 10;
    }
    if webhook && !cred_access && !env_access {
        bonus += 10;
    }

    bonus
}
