//! # Voltline CLI
//!
//! Command line front end for `calc_core`. The binary in `main.rs` only
//! parses arguments, installs logging and prints the [`commands::Report`];
//! everything else lives here so it can be tested without a process.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
