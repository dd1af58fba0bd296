//! kthold CLI
//!
//! Runs a Kotlin lint engine over files and reports only violations that
//! are not already accepted in the project baseline.

mod cli;
mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::{baseline, format, lint, rules};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Commands::Lint {
            files,
            reporter,
            overrides,
        } => lint::run_lint(cli, files, *reporter, overrides),
        Commands::Format {
            files,
            reporter,
            overrides,
        } => format::run_format(cli, files, *reporter, overrides),
        Commands::Rules { overrides } => rules::run_rules(cli, overrides),
        Commands::Baseline {
            files,
            output,
            overrides,
        } => baseline::run_baseline(cli, files, output, overrides),
    }
}
