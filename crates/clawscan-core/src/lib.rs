//! Static security analysis for agent skill packages.
//!
//! A skill is a directory with a `SKILL.md` manifest plus scripts and
//! config. [`Scanner::scan`] walks the tree with seven analyzers, collects
//! localized findings, and derives a SAFE / WARNING / DANGEROUS verdict
//! from a combination-aware risk score.
//!
//! ```no_run
//! use clawscan_core::Scanner;
//!
//! fn main() -> anyhow::Result<()> {
//!     let report = Scanner::with_builtin_catalog().scan("./my-skill")?;
//!     println!("{} {} ({})", report.risk.emoji, report.risk.label, report.risk.score);
//!     Ok(())
//! }
//! ```

pub mod analyzers;
pub mod catalog;
pub mod engine;
pub mod ip;
pub mod risk;
pub mod scanner;
pub mod types;
pub mod walker;

pub use catalog::{Blocklist, Catalog, PatternCatalog, RuleSpec};
pub use scanner::Scanner;
pub use types::{
    AnalyzerResult, AnalyzerStatus, Finding, Risk, RiskLevel, ScanReport, Severity, Summary,
};
