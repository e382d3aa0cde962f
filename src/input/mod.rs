//! Numeric input parsing.
//!
//! Values may come from command-line arguments or from a text file.
//! Files hold numbers separated by whitespace, commas or newlines;
//! everything after a `#` on a line is ignored.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors produced while parsing numeric input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// A token could not be parsed as a number.
    #[error("line {line}: '{token}' is not a number")]
    InvalidNumber { line: usize, token: String },
}

/// Parse numbers out of free-form text.
pub fn parse_values(text: &str) -> Result<Vec<f64>, InputError> {
    let mut values = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or("");

        for token in line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            values.push(parse_number(token).ok_or_else(|| InputError::InvalidNumber {
                line: idx + 1,
                token: token.to_string(),
            })?);
        }
    }

    Ok(values)
}

/// Parse command-line value arguments.
///
/// Each argument may itself hold several comma-separated numbers.
pub fn parse_args(args: &[String]) -> Result<Vec<f64>, InputError> {
    parse_values(&args.join(" "))
}

/// Read and parse a file of numbers.
pub fn read_values(path: &Path) -> Result<Vec<f64>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read values file: {}", path.display()))?;

    let values = parse_values(&content)
        .with_context(|| format!("Failed to parse values file: {}", path.display()))?;

    debug!("Read {} values from {}", values.len(), path.display());
    Ok(values)
}

/// Parse a single finite number.
fn parse_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}
