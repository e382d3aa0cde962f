//! Data models for aggregation results and reports.
//!
//! This module contains the core data structures shared by the
//! aggregator, the calculator session and the report generator.

use crate::calculator::HistoryEntry;
use crate::scenario::ScenarioOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do when a non-empty sequence sums to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroTotalPolicy {
    /// Fail with a domain error (default)
    #[default]
    Error,
    /// Mark every contribution as undefined (NaN)
    Undefined,
    /// Report every contribution as zero
    Zero,
}

impl fmt::Display for ZeroTotalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZeroTotalPolicy::Error => write!(f, "error"),
            ZeroTotalPolicy::Undefined => write!(f, "undefined"),
            ZeroTotalPolicy::Zero => write!(f, "zero"),
        }
    }
}

/// Whether the contributions of a summary are meaningful shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareStatus {
    /// Contributions are real percentages of a nonzero total.
    Defined,
    /// Total was zero; contributions are NaN.
    Undefined,
    /// Total was zero; contributions were forced to 0.
    Zeroed,
}

impl ShareStatus {
    /// Returns true when the contributions are percentages of a real total.
    pub fn is_defined(&self) -> bool {
        matches!(self, ShareStatus::Defined)
    }
}

/// Total, mean and per-element contributions of a non-empty sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Number of input values.
    pub count: usize,
    /// Sum of all values.
    pub total: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Share of total per value, in input order, as a rounded percentage.
    pub contributions: Vec<f64>,
    /// Whether `contributions` hold real shares.
    pub shares: ShareStatus,
}

impl Summary {
    /// Sum of all contributions. Only meaningful when shares are defined.
    pub fn contribution_sum(&self) -> f64 {
        self.contributions.iter().sum()
    }
}

/// Outcome of aggregating a numeric sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Aggregation {
    /// The input held no values.
    Empty,
    /// The input held at least one value.
    Summary(Summary),
}

impl Aggregation {
    /// Returns the summary, if any.
    pub fn summary(&self) -> Option<&Summary> {
        match self {
            Aggregation::Empty => None,
            Aggregation::Summary(summary) => Some(summary),
        }
    }

    /// Returns true for the empty sentinel.
    pub fn is_empty(&self) -> bool {
        matches!(self, Aggregation::Empty)
    }
}

/// An aggregation together with the values it was computed from.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationSection {
    /// Input values in order.
    pub values: Vec<f64>,
    /// Result of aggregating `values`.
    pub result: Aggregation,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Report title.
    pub title: String,
    /// Time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Version of the tool that generated it.
    pub tool_version: String,
    /// Decimal places used for contributions.
    pub precision: u32,
    /// Zero-total policy in effect.
    pub zero_total: ZeroTotalPolicy,
}

/// The complete report for one run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Aggregation of the run's values, if any were aggregated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregationSection>,
    /// Calculator operations performed during the run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
    /// Scenario outcomes, in execution order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<ScenarioOutcome>,
}

impl Report {
    /// Creates a new report with the given metadata.
    pub fn new(metadata: ReportMetadata) -> Self {
        Self {
            metadata,
            aggregation: None,
            history: Vec::new(),
            scenarios: Vec::new(),
        }
    }

    /// Number of failed scenarios in the report.
    pub fn failed_scenarios(&self) -> usize {
        self.scenarios.iter().filter(|s| !s.is_success()).count()
    }
}
