//! Subcommand implementations.
//!
//! Each command builds a [`Report`]: the serializable result plus a text
//! rendering. `main` decides which one to print.

mod cables;
mod calc;
mod job;
mod quiz;

use std::path::Path;

use anyhow::{Context, Result};
use calc_core::CalcError;
use serde::Serialize;

use crate::cli::Command;
use crate::config::CliConfig;

pub use cables::run_cables;
pub use calc::{run_cable_size, run_max_demand, run_min_charge, run_voltage_drop, run_zs};
pub use job::run_job;
pub use quiz::run_quiz;

/// Output of a command
#[derive(Debug, Clone)]
pub struct Report {
    pub json: serde_json::Value,
    pub text: String,
}

impl Report {
    pub fn new(value: &impl Serialize, text: String) -> Result<Self> {
        Ok(Report {
            json: serde_json::to_value(value).context("serializing result")?,
            text,
        })
    }
}

/// Run a parsed subcommand
pub fn execute(command: &Command, config: &CliConfig) -> Result<Report> {
    match command {
        Command::VoltageDrop(args) => run_voltage_drop(args, config),
        Command::MaxDemand(args) => run_max_demand(args, config),
        Command::MinCharge(args) => run_min_charge(args, config),
        Command::CableSize(args) => run_cable_size(args, config),
        Command::Zs(args) => run_zs(args, config),
        Command::Cables { action } => run_cables(action),
        Command::Job { action } => run_job(action, config),
        Command::Quiz(args) => run_quiz(args),
    }
}

/// Inline JSON if it looks like JSON, otherwise read from a file
pub(crate) fn json_arg(arg: &str) -> Result<String> {
    let trimmed = arg.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Ok(arg.to_string());
    }
    std::fs::read_to_string(Path::new(arg))
        .map_err(|e| anyhow::Error::from(CalcError::file_error("read", arg, e.to_string())))
}

pub(crate) fn pass_fail(passes: bool) -> &'static str {
    if passes {
        "PASS"
    } else {
        "FAIL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use tempfile::TempDir;

    fn run_args(args: &[&str], config: &CliConfig) -> Result<Report> {
        let cli = Cli::try_parse_from(args)?;
        execute(&cli.command, config)
    }

    #[test]
    fn test_job_flow_from_arguments() {
        let dir = TempDir::new().unwrap();
        let job = dir.path().join("flat.vlt");
        let job = job.to_str().unwrap();
        let item_file = dir.path().join("zs.json");
        std::fs::write(
            &item_file,
            r#"{"type":"EarthFaultLoop","label":"cooker","device":{"device_type":"McbB","rating_a":32.0},
               "r1_r2_ohms":0.3}"#,
        )
        .unwrap();
        let config = CliConfig::default();

        run_args(&["voltline", "job", "new", job, "--electrician", "A. Sparks", "--job-ref", "J-9"], &config).unwrap();
        run_args(
            &["voltline", "job", "add", job, "--item", item_file.to_str().unwrap(), "--user", "t"],
            &config,
        )
        .unwrap();
        let run = run_args(&["voltline", "job", "run", job], &config).unwrap();
        // TN-C-S Ze 0.35 + 0.3 = 0.65 Ω against 1.37 Ω for a B32
        assert_eq!(run.json["passed"], 1);
        assert_eq!(run.json["runs"][0]["outcome"]["type"], "EarthFaultLoop");
    }

    #[test]
    fn test_cable_size_from_arguments() {
        let report = run_args(
            &[
                "voltline", "cable-size", "--cable", "t&e", "--method", "C", "--current", "28", "--length", "15",
            ],
            &CliConfig::default(),
        )
        .unwrap();
        assert_eq!(report.json["device_rating_a"].as_f64(), Some(32.0));
        // 1.5 mm² (26 A) is below In; 2.5 mm² (36 A) drops 7.56 V
        assert_eq!(report.json["selected_size_mm2"].as_f64(), Some(2.5));
    }

    #[test]
    fn test_json_arg_missing_file() {
        let err = json_arg("no-such-loads.json").unwrap_err();
        assert_eq!(err.downcast_ref::<CalcError>().unwrap().error_code(), "FILE_ERROR");
        assert_eq!(json_arg(" [1]").unwrap(), " [1]");
    }
}
