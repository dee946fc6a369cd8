use clap::{Parser, Subcommand};

/// ClawScan - pre-install security scanner for agent skills
#[derive(Parser, Debug)]
#[command(name = "clawscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a skill directory and print the risk verdict
    Scan {
        /// Path to the skill directory
        #[arg(value_name = "SKILL_DIR")]
        skill_dir: String,

        /// Output the full report as JSON
        #[arg(long, default_value = "false")]
        json: bool,

        /// Directory containing patterns.json and blocklist.json overrides
        #[arg(long, value_name = "DIR")]
        rules_dir: Option<String>,

        /// Hide findings below this severity (info, warning, critical)
        #[arg(long, value_name = "LEVEL", default_value = "info")]
        min_severity: String,
    },
}
