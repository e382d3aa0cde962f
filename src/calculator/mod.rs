//! Basic arithmetic with an explicit operation history.
//!
//! The [`Calculator`] holds no state. Callers own a [`History`] for the
//! session and pass it to every evaluation; only successful operations
//! are recorded.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing or evaluating an operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// An operand is not a number.
    #[error("invalid operand '{input}': expected a number")]
    InvalidOperand { input: String },

    /// Division with a zero divisor.
    #[error("division by zero is not allowed")]
    DivisionByZero,

    /// The operator symbol is not recognised.
    #[error("operator '{op}' is not supported")]
    UnsupportedOperator { op: String },

    /// The expression does not have the `a op b` shape.
    #[error("malformed expression '{input}': expected '<number> <op> <number>'")]
    MalformedExpression { input: String },
}

/// A binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// Returns the operator's symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
        }
    }

    /// Apply the operator to two operands.
    pub fn apply(&self, lhs: f64, rhs: f64) -> Result<f64, CalcError> {
        match self {
            Operator::Add => Ok(lhs + rhs),
            Operator::Subtract => Ok(lhs - rhs),
            Operator::Multiply => Ok(lhs * rhs),
            Operator::Divide => {
                if rhs == 0.0 {
                    Err(CalcError::DivisionByZero)
                } else {
                    Ok(lhs / rhs)
                }
            }
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Add => write!(f, "add"),
            Operator::Subtract => write!(f, "subtract"),
            Operator::Multiply => write!(f, "multiply"),
            Operator::Divide => write!(f, "divide"),
        }
    }
}

impl FromStr for Operator {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "+" | "add" => Ok(Operator::Add),
            "-" | "sub" | "subtract" => Ok(Operator::Subtract),
            "*" | "x" | "mul" | "multiply" => Ok(Operator::Multiply),
            "/" | "div" | "divide" => Ok(Operator::Divide),
            other => Err(CalcError::UnsupportedOperator {
                op: other.to_string(),
            }),
        }
    }
}

/// Parse a finite operand.
pub fn parse_operand(input: &str) -> Result<f64, CalcError> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CalcError::InvalidOperand {
            input: input.trim().to_string(),
        })
}

/// A parsed `lhs op rhs` expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expression {
    pub lhs: f64,
    pub operator: Operator,
    pub rhs: f64,
}

impl Expression {
    /// Parse an expression such as `"10 + 5"`.
    ///
    /// Operands are checked before the operator, so `"abc % 5"` reports
    /// the bad operand.
    pub fn parse(input: &str) -> Result<Self, CalcError> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let [lhs, op, rhs] = tokens.as_slice() else {
            return Err(CalcError::MalformedExpression {
                input: input.trim().to_string(),
            });
        };

        Ok(Self {
            lhs: parse_operand(lhs)?,
            rhs: parse_operand(rhs)?,
            operator: op.parse()?,
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.operator.symbol(), self.rhs)
    }
}

/// One recorded operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub operator: Operator,
    pub lhs: f64,
    pub rhs: f64,
    pub result: f64,
}

/// Ordered log of successful operations for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Results of every recorded operation, in order.
    pub fn results(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.result).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the history, returning its entries.
    pub fn into_entries(self) -> Vec<HistoryEntry> {
        self.entries
    }
}

/// Stateless arithmetic evaluator.
#[derive(Debug, Default, Clone, Copy)]
pub struct Calculator;

impl Calculator {
    /// Apply `operator` and record the operation in `history` on success.
    pub fn apply(
        &self,
        operator: Operator,
        lhs: f64,
        rhs: f64,
        history: &mut History,
    ) -> Result<f64, CalcError> {
        let result = operator.apply(lhs, rhs)?;
        history.record(HistoryEntry {
            operator,
            lhs,
            rhs,
            result,
        });
        Ok(result)
    }

    /// Evaluate a parsed expression against the session history.
    pub fn evaluate(&self, expr: &Expression, history: &mut History) -> Result<f64, CalcError> {
        self.apply(expr.operator, expr.lhs, expr.rhs, history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let calc = Calculator;
        let mut history = History::new();

        assert_eq!(calc.apply(Operator::Add, 10.0, 5.0, &mut history), Ok(15.0));
        assert_eq!(calc.apply(Operator::Subtract, 20.0, 8.0, &mut history), Ok(12.0));
        assert_eq!(calc.apply(Operator::Multiply, 6.0, 7.0, &mut history), Ok(42.0));
        assert_eq!(calc.apply(Operator::Divide, 100.0, 4.0, &mut history), Ok(25.0));
        assert_eq!(history.results(), vec![15.0, 12.0, 42.0, 25.0]);
    }

    #[test]
    fn test_division_by_zero_not_recorded() {
        let calc = Calculator;
        let mut history = History::new();

        let result = calc.apply(Operator::Divide, 10.0, 0.0, &mut history);
        assert_eq!(result, Err(CalcError::DivisionByZero));
        assert!(history.is_empty());
    }

    #[test]
    fn test_operator_from_str() {
        assert_eq!("+".parse::<Operator>(), Ok(Operator::Add));
        assert_eq!("SUB".parse::<Operator>(), Ok(Operator::Subtract));
        assert_eq!("x".parse::<Operator>(), Ok(Operator::Multiply));
        assert_eq!("div".parse::<Operator>(), Ok(Operator::Divide));
        assert_eq!(
            "%".parse::<Operator>(),
            Err(CalcError::UnsupportedOperator {
                op: "%".to_string()
            })
        );
    }

    #[test]
    fn test_expression_parse() {
        let expr = Expression::parse("50 / 5").unwrap();
        assert_eq!(expr.lhs, 50.0);
        assert_eq!(expr.operator, Operator::Divide);
        assert_eq!(expr.rhs, 5.0);
        assert_eq!(expr.to_string(), "50 / 5");
    }

    #[test]
    fn test_expression_display_normalizes_input() {
        let expr = Expression::parse("  -2.50   mul 4 ").unwrap();
        assert_eq!(expr.to_string(), "-2.5 * 4");
    }

    #[test]
    fn test_expression_parse_errors() {
        assert!(matches!(
            Expression::parse("abc + 5"),
            Err(CalcError::InvalidOperand { .. })
        ));
        assert!(matches!(
            Expression::parse("10 % 5"),
            Err(CalcError::UnsupportedOperator { .. })
        ));
        assert!(matches!(
            Expression::parse("10 +"),
            Err(CalcError::MalformedExpression { .. })
        ));
        assert!(matches!(
            Expression::parse("1 + 2 + 3"),
            Err(CalcError::MalformedExpression { .. })
        ));
    }

    #[test]
    fn test_evaluate_records_history() {
        let calc = Calculator;
        let mut history = History::new();

        let expr = Expression::parse("2 * 21").unwrap();
        assert_eq!(calc.evaluate(&expr, &mut history), Ok(42.0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.into_entries()[0].operator, Operator::Multiply);
    }

    #[test]
    fn test_separate_sessions_do_not_share_history() {
        let calc = Calculator;
        let mut first = History::new();
        let mut second = History::new();

        calc.apply(Operator::Add, 1.0, 1.0, &mut first).unwrap();
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());

        calc.apply(Operator::Add, 2.0, 2.0, &mut second).unwrap();
        assert_eq!(second.into_entries()[0].result, 4.0);
    }
}
