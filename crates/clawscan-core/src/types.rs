//! Core types for scan findings and reports.
//!
//! This module contains the data model shared by every analyzer and by the
//! risk aggregator: severities, findings, per-analyzer outcomes, and the
//! final scan report.

use serde::{Deserialize, Serialize};

/// Severity of a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A single flagged observation tied to a rule, file, line, and severity.
///
/// `file` is always a path relative to the skill root (or the literal
/// `SKILL.md`); `line` is 1-based and refers to the file as the user views
/// it. Findings produced from extracted code blocks are rewritten by the
/// sub-pipeline so their `line` points back into SKILL.md.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Name of the analyzer that produced this finding.
    pub analyzer: String,
    pub severity: Severity,
    pub file: String,
    pub line: Option<u32>,
    pub message: String,
    /// Identifier of the rule or heuristic that fired.
    pub rule_id: String,
    /// Trimmed snippet of the matched text, capped at 120 chars.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
}

impl Finding {
    pub fn new(
        analyzer: &str,
        severity: Severity,
        file: impl Into<String>,
        line: Option<u32>,
        rule_id: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            analyzer: analyzer.to_string(),
            severity,
            file: file.into(),
            line,
            message: message.into(),
            rule_id: rule_id.to_string(),
            matched: None,
        }
    }

    pub fn with_match(mut self, snippet: impl Into<String>) -> Self {
        self.matched = Some(snippet.into());
        self
    }
}

/// Whether an analyzer completed or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerStatus {
    Ok,
    Error,
}

/// Outcome of one analyzer run: finding count, elapsed time, and status.
///
/// A failing analyzer contributes zero findings and records its error here;
/// it never aborts the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerResult {
    pub name: String,
    pub findings: usize,
    pub elapsed_ms: u64,
    pub status: AnalyzerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Finding counts by severity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

impl Summary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Summary {
            total: findings.len(),
            ..Default::default()
        };
        for finding in findings {
            match finding.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }
}

/// Final verdict level, derived purely from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Warning,
    Dangerous,
}

impl RiskLevel {
    /// `score >= 50` is dangerous, `>= 20` is warning, anything else safe.
    pub fn from_score(score: u32) -> Self {
        if score >= 50 {
            RiskLevel::Dangerous
        } else if score >= 20 {
            RiskLevel::Warning
        } else {
            RiskLevel::Safe
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Warning => "WARNING",
            RiskLevel::Dangerous => "DANGEROUS",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            RiskLevel::Safe => "🟢",
            RiskLevel::Warning => "🟡",
            RiskLevel::Dangerous => "🔴",
        }
    }
}

/// Aggregated risk verdict for a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Risk {
    pub score: u32,
    pub level: RiskLevel,
    pub label: String,
    pub emoji: String,
}

impl Risk {
    pub fn from_score(score: u32) -> Self {
        let level = RiskLevel::from_score(score);
        Self {
            score,
            level,
            label: level.label().to_string(),
            emoji: level.emoji().to_string(),
        }
    }
}

/// Complete report for one skill scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// The target exactly as the caller supplied it.
    pub target: String,
    /// Resolved skill root directory.
    pub path: String,
    /// RFC 3339 timestamp of the scan.
    pub timestamp: String,
    pub findings: Vec<Finding>,
    pub analyzers: Vec<AnalyzerResult>,
    pub summary: Summary,
    pub risk: Risk,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
        assert_eq!(serde_json::to_string(&Severity::Info).unwrap(), "\"info\"");
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(19), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(20), RiskLevel::Warning);
        assert_eq!(RiskLevel::from_score(49), RiskLevel::Warning);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::Dangerous);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Dangerous);
    }

    #[test]
    fn summary_counts_by_severity() {
        let findings = vec![
            Finding::new("scripts", Severity::Critical, "a.sh", Some(1), "x", "m"),
            Finding::new("scripts", Severity::Warning, "a.sh", Some(2), "y", "m"),
            Finding::new("network", Severity::Warning, "b.py", None, "z", "m"),
            Finding::new("skill-md", Severity::Info, "SKILL.md", None, "w", "m"),
        ];
        let summary = Summary::from_findings(&findings);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.warning, 2);
        assert_eq!(summary.info, 1);
        assert_eq!(summary.critical + summary.warning + summary.info, summary.total);
    }

    #[test]
    fn finding_match_snippet_roundtrip() {
        let finding = Finding::new("network", Severity::Critical, "x.sh", Some(3), "blocklistedIP", "bad")
            .with_match("curl http://185.220.101.42/x");
        let json = serde_json::to_string(&finding).unwrap();
        let back: Finding = serde_json::from_str(&json).unwrap();
        assert_eq!(back.matched.as_deref(), Some("curl http://185.220.101.42/x"));
        assert_eq!(back.line, Some(3));
    }
}
