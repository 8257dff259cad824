//! `voltline` binary entry point.

use std::process::ExitCode;

use anyhow::{Context, Result};
use calc_cli::cli::Cli;
use calc_cli::commands;
use calc_cli::config::CliConfig;
use calc_cli::logging;
use calc_core::CalcError;
use clap::Parser;

fn run(cli: &Cli) -> Result<()> {
    let config = CliConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let report = commands::execute(&cli.command, &config)?;

    if cli.json || config.output.json {
        println!("{}", serde_json::to_string_pretty(&report.json)?);
    } else {
        println!("{}", report.text);
    }
    Ok(())
}

/// Structured error for stderr. Non-domain failures are wrapped as internal
/// errors carrying the full context chain.
fn error_json(err: &anyhow::Error) -> String {
    let calc_error = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<CalcError>())
        .cloned()
        .unwrap_or_else(|| CalcError::Internal {
            message: format!("{:#}", err),
        });
    serde_json::to_string_pretty(&calc_error).unwrap_or_else(|_| format!("{{\"message\": \"{}\"}}", err))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose, cli.log_json);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{:#}", err), "command failed");
            eprintln!("{}", error_json(&err));
            ExitCode::FAILURE
        }
    }
}
