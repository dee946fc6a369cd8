mod cli;
mod commands;
mod observability;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    observability::init_tracing();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Scan {
            skill_dir,
            json,
            rules_dir,
            min_severity,
        } => commands::scan::run(&skill_dir, json, rules_dir.as_deref(), &min_severity),
    };

    match outcome {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(3);
        }
    }
}
