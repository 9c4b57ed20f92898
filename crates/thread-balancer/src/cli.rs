//! CLI argument definitions for the balancer.

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Output format for the balance report.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

/// Arguments for the balance command.
#[derive(Args, Clone, Debug)]
pub struct BalanceArgs {
    /// Substring of the target processes' name
    #[arg(long, short = 'p')]
    pub process: String,

    /// JSON file mapping app name and thread name to CPU indices
    #[arg(long, short = 'f')]
    pub pinfile: PathBuf,

    /// Report format
    #[arg(long, value_enum, default_value = "table")]
    pub output_format: OutputFormat,
}
