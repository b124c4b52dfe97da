//! Common CLI types shared across commands.

use clap::ValueEnum;

/// Output format for the solved recovery plan.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary (default for interactive use)
    #[default]
    Table,
    /// Full result record as JSON (pipe-friendly, structured)
    Json,
}
