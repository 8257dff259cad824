//! # calc_core - BS 7671 Electrical Calculation Engine
//!
//! `calc_core` is the computational heart of Voltline: the calculations a UK
//! electrician makes when designing, pricing and certifying a job. All inputs
//! and outputs are JSON-serializable so any front end (the `voltline` CLI, a
//! web form, another program) can drive it.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use calc_core::calculations::voltage_drop::{calculate, VoltageDropInput};
//! use calc_core::cables::CableType;
//!
//! let input = VoltageDropInput {
//!     cable_type: Some(CableType::PvcTwinEarth),
//!     size_mm2: 2.5,
//!     length_m: 20.0,
//!     current_a: 20.0,
//!     ..VoltageDropInput::new("Kitchen radial")
//! };
//! let result = calculate(&input).unwrap();
//! println!("{:.2} % drop", result.voltage_drop_percent);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Voltage drop, maximum demand, minimum charge, cable sizing, Zs
//! - [`cables`] - Cable database: ratings, impedances, pricing
//! - [`inspection`] - Inspection schedules and classification codes
//! - [`quiz`] - Question banks and scoring
//! - [`project`] - Job container, metadata, and settings
//! - [`file_io`] - Job files with atomic saves and locking
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod cables;
pub mod calculations;
pub mod errors;
pub mod file_io;
pub mod inspection;
pub mod project;
pub mod quiz;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{CalculationItem, CalculationOutcome};
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_project, save_project, FileLock};
pub use project::{GlobalSettings, Project, ProjectMetadata};
