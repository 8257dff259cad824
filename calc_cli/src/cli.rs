//! Command line definition.

use std::path::PathBuf;

use calc_core::cables::{CableType, InstallationMethod};
use calc_core::calculations::earth_fault_loop::DeviceType;
use calc_core::inspection::{CertificateType, Outcome};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "voltline")]
#[command(version, about = "BS 7671 calculators for UK electricians")]
pub struct Cli {
    /// Config file (defaults to ./voltline.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Voltage drop along a circuit
    VoltageDrop(VoltageDropArgs),
    /// Diversified maximum demand and supply size
    MaxDemand(MaxDemandArgs),
    /// Minimum price for a job
    MinCharge(MinChargeArgs),
    /// Smallest compliant cable size
    CableSize(CableSizeArgs),
    /// Predicted earth fault loop impedance
    Zs(ZsArgs),
    /// Browse the cable database
    Cables {
        #[command(subcommand)]
        action: CablesCommand,
    },
    /// Create and run job files
    Job {
        #[command(subcommand)]
        action: JobCommand,
    },
    /// Score answers against a question bank
    Quiz(QuizArgs),
}

pub fn parse_cable(s: &str) -> Result<CableType, String> {
    CableType::from_str_flexible(s).map_err(|e| e.to_string())
}

pub fn parse_method(s: &str) -> Result<InstallationMethod, String> {
    InstallationMethod::from_str_flexible(s).map_err(|e| e.to_string())
}

/// `b`, `c`, `d`, `rcbo-b`, ... into a device type
pub fn parse_device_type(s: &str) -> Result<DeviceType, String> {
    match s.to_lowercase().replace(['_', ' '], "-").as_str() {
        "b" | "mcb-b" => Ok(DeviceType::McbB),
        "c" | "mcb-c" => Ok(DeviceType::McbC),
        "d" | "mcb-d" => Ok(DeviceType::McbD),
        "rcbo-b" => Ok(DeviceType::RcboB),
        "rcbo-c" => Ok(DeviceType::RcboC),
        "rcbo-d" => Ok(DeviceType::RcboD),
        _ => Err(format!("unknown device type '{}': expected b, c, d or rcbo-b/c/d", s)),
    }
}

pub fn parse_outcome(s: &str) -> Result<Outcome, String> {
    match s.to_lowercase().replace(['_', ' '], "-").as_str() {
        "ok" | "pass" | "satisfactory" => Ok(Outcome::Satisfactory),
        "c1" => Ok(Outcome::C1),
        "c2" => Ok(Outcome::C2),
        "c3" => Ok(Outcome::C3),
        "fi" => Ok(Outcome::FI),
        "nv" | "not-verified" => Ok(Outcome::NotVerified),
        "lim" | "limitation" => Ok(Outcome::Limitation),
        "na" | "n/a" | "not-applicable" => Ok(Outcome::NotApplicable),
        _ => Err(format!("unknown outcome '{}': expected ok, c1, c2, c3, fi, nv, lim or na", s)),
    }
}

pub fn parse_certificate(s: &str) -> Result<CertificateType, String> {
    match s.to_lowercase().as_str() {
        "eicr" => Ok(CertificateType::Eicr),
        "eic" => Ok(CertificateType::Eic),
        "meiwc" | "minor-works" => Ok(CertificateType::Meiwc),
        _ => Err(format!("unknown certificate '{}': expected eicr, eic or meiwc", s)),
    }
}

#[derive(Debug, Clone, Args)]
pub struct VoltageDropArgs {
    /// Cable type (e.g. "t&e", "swa")
    #[arg(long, value_parser = parse_cable)]
    pub cable: Option<CableType>,

    /// Conductor size (mm²)
    #[arg(long, default_value_t = 0.0)]
    pub size: f64,

    /// Tabulated mV/A/m, instead of a database lookup
    #[arg(long)]
    pub mv: Option<f64>,

    /// Route length (m)
    #[arg(long)]
    pub length: f64,

    /// Design current (A)
    #[arg(long)]
    pub current: f64,

    #[arg(long, default_value_t = 1.0)]
    pub pf: f64,

    #[arg(long)]
    pub three_phase: bool,

    #[arg(long)]
    pub aluminium: bool,

    /// Apply the 3 % lighting limit instead of 5 %
    #[arg(long)]
    pub lighting: bool,

    /// Supply voltage (defaults to config)
    #[arg(long)]
    pub voltage: Option<f64>,

    /// Voltage drop limit in % (defaults to the config limit for the circuit use)
    #[arg(long)]
    pub limit: Option<f64>,

    #[arg(long, default_value = "voltage-drop")]
    pub label: String,
}

#[derive(Debug, Clone, Args)]
pub struct MaxDemandArgs {
    /// JSON array of loads, inline or as a file path
    #[arg(long)]
    pub loads: String,

    #[arg(long)]
    pub three_phase: bool,

    #[arg(long)]
    pub voltage: Option<f64>,

    #[arg(long, default_value = "max-demand")]
    pub label: String,
}

/// Unset values fall back to the `[business]` config section
#[derive(Debug, Clone, Args)]
pub struct MinChargeArgs {
    #[arg(long)]
    pub rate: Option<f64>,

    #[arg(long)]
    pub hours: Option<f64>,

    #[arg(long)]
    pub overhead: Option<f64>,

    /// Travel time (minutes)
    #[arg(long)]
    pub travel: Option<f64>,

    /// Admin time (minutes)
    #[arg(long)]
    pub admin: Option<f64>,

    #[arg(long, default_value_t = 0.0)]
    pub materials: f64,

    #[arg(long)]
    pub uplift: Option<f64>,

    /// Round up to a multiple of this amount
    #[arg(long)]
    pub step: Option<f64>,

    /// Add VAT regardless of config
    #[arg(long)]
    pub vat: bool,

    /// Leave VAT off regardless of config
    #[arg(long, conflicts_with = "vat")]
    pub no_vat: bool,

    #[arg(long, default_value = "min-charge")]
    pub label: String,
}

impl MinChargeArgs {
    /// VAT setting from the flags, `None` to use the config
    pub fn vat_override(&self) -> Option<bool> {
        match (self.vat, self.no_vat) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct CableSizeArgs {
    #[arg(long, value_parser = parse_cable)]
    pub cable: CableType,

    /// Reference installation method (A1 .. G)
    #[arg(long, value_parser = parse_method)]
    pub method: InstallationMethod,

    /// Design current Ib (A)
    #[arg(long)]
    pub current: f64,

    /// Protective device rating In (A)
    #[arg(long)]
    pub device: Option<f64>,

    #[arg(long)]
    pub length: f64,

    /// Ambient temperature factor Ca
    #[arg(long, default_value_t = 1.0)]
    pub ca: f64,

    /// Grouping factor Cg
    #[arg(long, default_value_t = 1.0)]
    pub cg: f64,

    /// Thermal insulation factor Ci
    #[arg(long, default_value_t = 1.0)]
    pub ci: f64,

    #[arg(long, default_value_t = 1.0)]
    pub pf: f64,

    #[arg(long)]
    pub three_phase: bool,

    #[arg(long)]
    pub lighting: bool,

    /// Supply voltage (defaults to config)
    #[arg(long)]
    pub voltage: Option<f64>,

    /// Voltage drop limit in % (defaults to the config limit for the circuit use)
    #[arg(long)]
    pub limit: Option<f64>,

    #[arg(long, default_value = "cable-size")]
    pub label: String,
}

#[derive(Debug, Clone, Args)]
pub struct ZsArgs {
    /// b, c, d, rcbo-b, rcbo-c or rcbo-d
    #[arg(long = "type", value_parser = parse_device_type)]
    pub device_type: DeviceType,

    /// Device rating In (A)
    #[arg(long)]
    pub rating: f64,

    /// Line conductor size (mm²)
    #[arg(long, default_value_t = 0.0)]
    pub line: f64,

    /// CPC size (mm²)
    #[arg(long, default_value_t = 0.0)]
    pub cpc: f64,

    #[arg(long, default_value_t = 0.0)]
    pub length: f64,

    /// Measured R1+R2 (Ω), instead of calculating from conductors
    #[arg(long)]
    pub r1r2: Option<f64>,

    /// External loop impedance Ze (defaults to config)
    #[arg(long)]
    pub ze: Option<f64>,

    #[arg(long, default_value = "zs")]
    pub label: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CablesCommand {
    /// List all cable types
    List,
    /// Full data for one cable type
    Show {
        #[arg(value_parser = parse_cable)]
        cable: CableType,
    },
    /// Cable types that may be installed by a method
    ForMethod {
        #[arg(value_parser = parse_method)]
        method: InstallationMethod,
        /// Only types with a size rated for at least this current (A)
        #[arg(long)]
        min_current: Option<f64>,
    },
    /// Price a length of cable, with cheaper alternatives
    Price {
        #[arg(value_parser = parse_cable)]
        cable: CableType,
        /// Conductor size (mm²)
        size: f64,
        /// Length required (m)
        metres: f64,
        /// Show alternatives costing at most this per metre
        #[arg(long)]
        budget: Option<f64>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum JobCommand {
    /// Create a new job file
    New {
        path: PathBuf,
        #[arg(long)]
        electrician: String,
        #[arg(long)]
        job_ref: String,
        #[arg(long, default_value = "")]
        client: String,
        #[arg(long, default_value = "")]
        site: String,
    },
    /// Add a calculation (tagged JSON, inline or file path) to a job
    Add {
        path: PathBuf,
        #[arg(long)]
        item: String,
        /// Name recorded in the lock file (defaults to $USER)
        #[arg(long)]
        user: Option<String>,
    },
    /// Print job details
    Show { path: PathBuf },
    /// Run every calculation in a job
    Run { path: PathBuf },
    /// Record an inspection schedule outcome, adding the item if it is new
    Inspect {
        path: PathBuf,
        /// Schedule item number, e.g. "3.5"
        #[arg(long)]
        item: String,
        #[arg(long, value_parser = parse_outcome)]
        outcome: Outcome,
        /// Item description (required for new items)
        #[arg(long)]
        description: Option<String>,
        /// Regulation reference
        #[arg(long, default_value = "")]
        clause: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Certificate type when the job has no schedule yet
        #[arg(long, value_parser = parse_certificate, default_value = "eicr")]
        certificate: CertificateType,
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct QuizArgs {
    /// Question bank JSON file
    #[arg(long)]
    pub bank: PathBuf,

    /// Answers as id=option pairs, e.g. "1=0,2=3"
    #[arg(long, default_value = "")]
    pub answers: String,

    /// Pass mark (%)
    #[arg(long)]
    pub pass_mark: Option<f64>,

    /// Draw this many questions at random instead of the whole bank
    #[arg(long)]
    pub count: Option<usize>,

    /// Seed for the random draw, to repeat the same paper
    #[arg(long, requires = "count")]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_voltage_drop() {
        let cli = Cli::try_parse_from([
            "voltline", "voltage-drop", "--cable", "t&e", "--size", "2.5", "--length", "20", "--current", "20",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::VoltageDrop(args) => {
                assert_eq!(args.cable, Some(CableType::PvcTwinEarth));
                assert_eq!(args.pf, 1.0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_cables_show() {
        let cli = Cli::try_parse_from(["voltline", "cables", "show", "swa"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Cables {
                action: CablesCommand::Show {
                    cable: CableType::SwaXlpe
                }
            }
        ));
    }

    #[test]
    fn test_bad_device_type() {
        assert!(parse_device_type("k").is_err());
        assert_eq!(parse_device_type("RCBO_C").unwrap(), DeviceType::RcboC);
    }

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::try_parse_from([
            "voltline", "job", "inspect", "job.vlt", "--item", "3.5", "--outcome", "c2", "--description", "Bonding",
        ])
        .unwrap();
        match cli.command {
            Command::Job {
                action: JobCommand::Inspect {
                    outcome, certificate, ..
                },
            } => {
                assert_eq!(outcome, Outcome::C2);
                assert_eq!(certificate, CertificateType::Eicr);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(parse_outcome("C4").is_err());
    }

    #[test]
    fn test_vat_flags() {
        let parse = |extra: &[&str]| {
            let mut args = vec!["voltline", "min-charge"];
            args.extend_from_slice(extra);
            match Cli::try_parse_from(args).map(|cli| cli.command) {
                Ok(Command::MinCharge(args)) => Ok(args.vat_override()),
                Ok(other) => panic!("unexpected command {:?}", other),
                Err(e) => Err(e),
            }
        };
        assert_eq!(parse(&[]).unwrap(), None);
        assert_eq!(parse(&["--vat"]).unwrap(), Some(true));
        assert_eq!(parse(&["--no-vat"]).unwrap(), Some(false));
        assert!(parse(&["--vat", "--no-vat"]).is_err());
    }
}
