//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::check::CheckArgs;

/// Agent shift compliance checker.
///
/// Reads agent presence from the Zendesk Chat timeline, rebuilds work
/// sessions, and reports late arrivals and early departures against the
/// odd-hour shift grid.
#[derive(Debug, Parser)]
#[command(name = "shift-check", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub check: CheckArgs,
}
