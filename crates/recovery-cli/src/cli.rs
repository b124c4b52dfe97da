use clap::{Parser, Subcommand};
use recovery_core::Objective;
use std::path::PathBuf;

use crate::common::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve a post-fault recovery plan from a JSON input record.
    Solve {
        /// Path to the JSON-encoded optimization input.
        #[arg(long)]
        input: PathBuf,
        /// Write the full result record to this path instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Override the objective named in the input file.
        #[arg(long, value_enum)]
        objective: Option<CliObjective>,
        /// Solver time limit in seconds.
        #[arg(long, default_value_t = 300.0)]
        time_limit_seconds: f64,
        /// Solver relative MIP gap tolerance.
        #[arg(long, default_value_t = 0.01)]
        mip_gap: f64,
        /// How to print the result when no `--output` file is given.
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

/// Mirrors [`recovery_core::Objective`] so clap can parse it without
/// relying on `ValueEnum` for a type owned by another crate.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum CliObjective {
    MinSwitchOp,
    MaxSafetyRegion,
    MinCost,
}

impl From<CliObjective> for Objective {
    fn from(value: CliObjective) -> Self {
        match value {
            CliObjective::MinSwitchOp => Objective::MinimizeSwitchOperation,
            CliObjective::MaxSafetyRegion => Objective::MaximizeSafetyRegion,
            CliObjective::MinCost => Objective::MinimizeGenCost,
        }
    }
}
