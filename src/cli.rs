//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::MAX_PRECISION;
use crate::models::ZeroTotalPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tally - share-of-total reports for numeric sequences
///
/// Aggregate numbers into total, mean and per-value percentage
/// contributions, run calculator sessions, and replay calculation
/// scenarios. Markdown/JSON reports.
///
/// Examples:
///   tally aggregate 10 20 30 40
///   tally aggregate --file values.txt --precision 3 --format json
///   tally aggregate 0 0 --zero-total undefined
///   tally calc "10 + 5" "20 - 8" "100 / 4"
///   tally calc --fail-fast -- "-5 + 3"
///   tally scenarios --strict
///   tally --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .tally.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Output file path for the report (stdout when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT", global = true)]
    pub format: OutputFormat,

    /// Report title
    #[arg(long, value_name = "TITLE", global = true)]
    pub title: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also append log output to this file
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Generate a default .tally.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Aggregate numbers into total, mean and contributions
    Aggregate(AggregateArgs),
    /// Evaluate "a op b" expressions in one calculator session
    Calc(CalcArgs),
    /// Run a table of calculation scenarios
    Scenarios(ScenarioArgs),
}

/// Arguments for `tally aggregate`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct AggregateArgs {
    /// Values to aggregate (comma or space separated)
    #[arg(value_name = "VALUES", allow_negative_numbers = true)]
    pub values: Vec<String>,

    /// Read additional values from a file
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Decimal places for contributions
    #[arg(short, long, value_name = "DIGITS", env = "TALLY_PRECISION")]
    pub precision: Option<u32>,

    /// What to report when the values sum to zero
    #[arg(long, value_name = "POLICY")]
    pub zero_total: Option<ZeroTotalArg>,

    /// Treat empty input as an error
    #[arg(long)]
    pub reject_empty: bool,
}

/// Arguments for `tally calc`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CalcArgs {
    /// Expressions such as "10 + 5" (put a negative left operand after `--`)
    #[arg(value_name = "EXPR", required = true, allow_negative_numbers = true)]
    pub expressions: Vec<String>,

    /// Stop at the first failing expression
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for `tally scenarios`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ScenarioArgs {
    /// TOML file of [[scenario]] entries (built-in table when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Exit with code 2 if any scenario fails
    #[arg(long)]
    pub strict: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Zero-total policy for --zero-total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ZeroTotalArg {
    Error,
    Undefined,
    Zero,
}

impl From<ZeroTotalArg> for ZeroTotalPolicy {
    fn from(arg: ZeroTotalArg) -> Self {
        match arg {
            ZeroTotalArg::Error => ZeroTotalPolicy::Error,
            ZeroTotalArg::Undefined => ZeroTotalPolicy::Undefined,
            ZeroTotalArg::Zero => ZeroTotalPolicy::Zero,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref title) = self.title {
            if title.trim().is_empty() {
                return Err("Title must not be empty".to_string());
            }
        }

        match self.command {
            None => Err("A command is required (aggregate, calc, scenarios)".to_string()),
            Some(Command::Aggregate(ref agg)) => {
                if let Some(precision) = agg.precision {
                    if precision > MAX_PRECISION {
                        return Err(format!("Precision must be at most {}", MAX_PRECISION));
                    }
                }
                if let Some(ref file) = agg.file {
                    if !file.is_file() {
                        return Err(format!("Values file does not exist: {}", file.display()));
                    }
                }
                Ok(())
            }
            Some(Command::Calc(ref calc)) => {
                if calc.expressions.iter().any(|e| e.trim().is_empty()) {
                    return Err("Expressions must not be empty".to_string());
                }
                Ok(())
            }
            Some(Command::Scenarios(ref scen)) => {
                if let Some(ref file) = scen.file {
                    if !file.is_file() {
                        return Err(format!(
                            "Scenario file does not exist: {}",
                            file.display()
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
