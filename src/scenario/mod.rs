//! Scenario runner for calculator operations.
//!
//! A scenario is one calculation given as raw strings, so input
//! validation failures are exercised alongside arithmetic failures.
//! Every outcome is classified and reported to an [`Observer`].

use crate::calculator::{parse_operand, CalcError, Calculator, History, Operator};
use crate::observer::{Event, Observer};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::Level;

/// One calculation to attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Human-readable label.
    pub description: String,
    /// Left operand, unparsed.
    pub lhs: String,
    /// Right operand, unparsed.
    pub rhs: String,
    /// Operator symbol, unparsed.
    pub operator: String,
}

impl Scenario {
    pub fn new(description: &str, lhs: &str, operator: &str, rhs: &str) -> Self {
        Self {
            description: description.to_string(),
            lhs: lhs.to_string(),
            rhs: rhs.to_string(),
            operator: operator.to_string(),
        }
    }
}

/// Classification of a failed scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidOperand,
    DivisionByZero,
    UnsupportedOperator,
}

impl FailureKind {
    /// Level at which failures of this kind are logged.
    pub fn level(&self) -> Level {
        match self {
            FailureKind::InvalidOperand | FailureKind::DivisionByZero => Level::ERROR,
            FailureKind::UnsupportedOperator => Level::WARN,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidOperand => write!(f, "Invalid operand"),
            FailureKind::DivisionByZero => write!(f, "Division by zero"),
            FailureKind::UnsupportedOperator => write!(f, "Unsupported operator"),
        }
    }
}

impl From<&CalcError> for FailureKind {
    fn from(err: &CalcError) -> Self {
        match err {
            CalcError::InvalidOperand { .. } | CalcError::MalformedExpression { .. } => {
                FailureKind::InvalidOperand
            }
            CalcError::DivisionByZero => FailureKind::DivisionByZero,
            CalcError::UnsupportedOperator { .. } => FailureKind::UnsupportedOperator,
        }
    }
}

/// Result of running a scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScenarioOutcome {
    Succeeded {
        description: String,
        expression: String,
        result: f64,
    },
    Failed {
        description: String,
        kind: FailureKind,
        message: String,
    },
}

impl ScenarioOutcome {
    pub fn description(&self) -> &str {
        match self {
            ScenarioOutcome::Succeeded { description, .. }
            | ScenarioOutcome::Failed { description, .. } => description,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScenarioOutcome::Succeeded { .. })
    }
}

/// File format for scenario tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    scenario: Vec<Scenario>,
}

/// The built-in scenario table: one success and one of each failure kind.
pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("Valid input", "50", "/", "5"),
        Scenario::new("Invalid operand", "abc", "+", "5"),
        Scenario::new("Division by zero", "10", "/", "0"),
        Scenario::new("Unsupported operator", "10", "%", "5"),
    ]
}

/// Load a scenario table from a TOML file of `[[scenario]]` entries.
pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;

    let file: ScenarioFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse scenario file: {}", path.display()))?;

    Ok(file.scenario)
}

/// Run one scenario, recording successful operations in `history`.
pub fn run_scenario(
    scenario: &Scenario,
    history: &mut History,
    observer: &dyn Observer,
) -> ScenarioOutcome {
    let outcome = match attempt(scenario, history) {
        Ok((operator, lhs, rhs, result)) => {
            let expression = format!("{} {} {}", lhs, operator.symbol(), rhs);
            observer.notify(Event::new(
                Level::INFO,
                format!("Successful operation: {} = {}", expression, result),
            ));
            ScenarioOutcome::Succeeded {
                description: scenario.description.clone(),
                expression,
                result,
            }
        }
        Err(err) => {
            let kind = FailureKind::from(&err);
            observer.notify(Event::new(kind.level(), format!("{} detected: {}", kind, err)));
            ScenarioOutcome::Failed {
                description: scenario.description.clone(),
                kind,
                message: err.to_string(),
            }
        }
    };

    observer.notify(Event::new(
        Level::DEBUG,
        format!("Scenario '{}' finished", scenario.description),
    ));

    outcome
}

/// Parse and apply a scenario's operation.
fn attempt(scenario: &Scenario, history: &mut History) -> Result<(Operator, f64, f64, f64), CalcError> {
    let lhs = parse_operand(&scenario.lhs)?;
    let rhs = parse_operand(&scenario.rhs)?;
    let operator: Operator = scenario.operator.parse()?;
    let result = Calculator.apply(operator, lhs, rhs, history)?;
    Ok((operator, lhs, rhs, result))
}

/// Run every scenario in order against one session history.
pub fn run_scenarios(
    scenarios: &[Scenario],
    history: &mut History,
    observer: &dyn Observer,
) -> Vec<ScenarioOutcome> {
    scenarios
        .iter()
        .map(|scenario| run_scenario(scenario, history, observer))
        .collect()
}
