//! The analyzer set.
//!
//! Each analyzer reads the skill tree independently and produces findings;
//! none of them mutates shared state, and a failure in one never affects
//! another. The orchestrator runs them in the fixed order returned by
//! [`default_analyzers`].

pub mod code_blocks;
pub mod credentials;
pub mod network;
pub mod obfuscation;
pub mod prompt_injection;
pub mod scripts;
pub mod skill_md;
pub mod typosquat;

use std::path::Path;

use anyhow::Result;

use crate::catalog::Catalog;
use crate::types::Finding;

/// Shared, read-only inputs for one analyzer run.
pub struct ScanContext<'a> {
    /// Resolved skill root directory.
    pub root: &'a Path,
    pub catalog: &'a Catalog,
}

/// A single static analyzer over a skill tree.
pub trait Analyzer {
    fn name(&self) -> &'static str;

    /// Inspect the skill and return findings. Errors are trapped by the
    /// orchestrator into an `AnalyzerResult` with `status: error`.
    fn analyze(&self, ctx: &ScanContext<'_>) -> Result<Vec<Finding>>;
}

/// The seven analyzers in their required execution order.
pub fn default_analyzers() -> Vec<Box<dyn Analyzer>> {
    vec![
        Box::new(skill_md::SkillMdAnalyzer),
        Box::new(scripts::ScriptAnalyzer),
        Box::new(network::NetworkAnalyzer),
        Box::new(credentials::CredentialsAnalyzer),
        Box::new(obfuscation::ObfuscationAnalyzer),
        Box::new(typosquat::TyposquatAnalyzer),
        Box::new(prompt_injection::PromptInjectionAnalyzer),
    ]
}
