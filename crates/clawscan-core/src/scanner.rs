//! Scan orchestration.
//!
//! Resolves the target, runs the seven analyzers in their fixed order with
//! per-analyzer timing and error isolation, then hands the combined finding
//! set to the risk aggregator. Only target resolution can fail the scan;
//! everything after it always produces a report.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use chrono::{SecondsFormat, Utc};

use crate::analyzers::{default_analyzers, ScanContext};
use crate::catalog::Catalog;
use crate::risk;
use crate::types::{AnalyzerResult, AnalyzerStatus, Finding, ScanReport, Summary};
use crate::walker;

/// A configured scanner. Holds the loaded rule catalogs; analyzers share
/// them read-only, so one scanner can serve any number of scans.
pub struct Scanner {
    catalog: Catalog,
}

impl Scanner {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Scanner with the embedded default catalogs.
    pub fn with_builtin_catalog() -> Self {
        Self::new(Catalog::builtin())
    }

    /// Scan a skill directory and produce the full report.
    ///
    /// Fails only when `target` does not resolve to a directory; analyzer
    /// failures are recorded in the report instead of propagating.
    pub fn scan(&self, target: &str) -> Result<ScanReport> {
        let root = PathBuf::from(target);
        if !root.exists() {
            bail!("skill path does not exist: {target}");
        }
        if !root.is_dir() {
            bail!("skill path is not a directory: {target}");
        }
        let root = root.canonicalize().unwrap_or(root);

        let ctx = ScanContext {
            root: &root,
            catalog: &self.catalog,
        };

        let mut findings: Vec<Finding> = Vec::new();
        let mut analyzer_results = Vec::new();

        for analyzer in default_analyzers() {
            let started = Instant::now();
            let outcome = analyzer.analyze(&ctx);
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(produced) => {
                    tracing::debug!(
                        analyzer = analyzer.name(),
                        findings = produced.len(),
                        elapsed_ms,
                        "analyzer finished"
                    );
                    analyzer_results.push(AnalyzerResult {
                        name: analyzer.name().to_string(),
                        findings: produced.len(),
                        elapsed_ms,
                        status: AnalyzerStatus::Ok,
                        error: None,
                    });
                    findings.extend(produced);
                }
                Err(e) => {
                    tracing::warn!(analyzer = analyzer.name(), error = %e, "analyzer failed");
                    analyzer_results.push(AnalyzerResult {
                        name: analyzer.name().to_string(),
                        findings: 0,
                        elapsed_ms,
                        status: AnalyzerStatus::Error,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let manifest = walker::read_capped(&root.join("SKILL.md")).unwrap_or_default();
        let cli_wrapper = risk::is_cli_wrapper(&manifest);
        let risk = risk::aggregate(&findings, cli_wrapper);
        let summary = Summary::from_findings(&findings);

        Ok(ScanReport {
            target: target.to_string(),
            path: root.display().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            findings,
            analyzers: analyzer_results,
            summary,
            risk,
        })
    }
}
