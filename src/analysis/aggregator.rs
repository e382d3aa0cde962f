//! Share-of-total aggregation and summary statistics.
//!
//! [`aggregate`] is pure: it reads its input slice and builds a fresh
//! [`Aggregation`]. [`analyze`] wraps it and reports progress to an
//! [`Observer`] supplied by the caller.

use crate::models::{Aggregation, ShareStatus, Summary, ZeroTotalPolicy};
use crate::observer::{Event, Observer};
use thiserror::Error;
use tracing::Level;

/// Default number of decimal places for contributions.
pub const DEFAULT_PRECISION: u32 = 2;

/// Largest supported number of decimal places.
pub const MAX_PRECISION: u32 = 10;

/// Errors produced while aggregating a sequence.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    /// Empty input while empty input is not allowed.
    #[error("no values to aggregate")]
    EmptyInput,

    /// A value was NaN or infinite.
    #[error("value at position {index} is not finite: {value}")]
    NonFinite { index: usize, value: f64 },

    /// The values summed past the range of f64.
    #[error("sum of {count} values overflows")]
    Overflow { count: usize },

    /// A share of total fell outside the range of f64.
    #[error("share of value at position {index} overflows: total {total} is too small")]
    ShareOverflow { index: usize, total: f64 },

    /// A non-empty sequence summed to zero, so shares of total are undefined.
    #[error("total of {count} values is zero; contributions are undefined")]
    ZeroTotal { count: usize },
}

/// Settings for a single aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateOptions {
    /// Decimal places kept in each contribution.
    pub precision: u32,
    /// Behaviour when a non-empty input sums to zero.
    pub zero_total: ZeroTotalPolicy,
    /// Return [`Aggregation::Empty`] for empty input instead of failing.
    pub allow_empty: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            zero_total: ZeroTotalPolicy::default(),
            allow_empty: true,
        }
    }
}

impl From<&crate::config::AggregateConfig> for AggregateOptions {
    fn from(config: &crate::config::AggregateConfig) -> Self {
        Self {
            precision: config.precision.min(MAX_PRECISION),
            zero_total: config.zero_total,
            allow_empty: config.allow_empty,
        }
    }
}

/// Aggregate a sequence into total, mean and per-value contributions.
///
/// `contributions[i]` is `values[i] / total * 100`, rounded to
/// `options.precision` decimal places. A zero total is resolved by
/// `options.zero_total` and is always visible in the result.
pub fn aggregate(values: &[f64], options: &AggregateOptions) -> Result<Aggregation, AggregateError> {
    if values.is_empty() {
        return if options.allow_empty {
            Ok(Aggregation::Empty)
        } else {
            Err(AggregateError::EmptyInput)
        };
    }

    if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(AggregateError::NonFinite { index, value });
    }

    let count = values.len();
    let total: f64 = values.iter().sum();
    if !total.is_finite() {
        return Err(AggregateError::Overflow { count });
    }

    let mean = total / count as f64;
    let std_dev = population_std_dev(values).unwrap_or(0.0);

    let (contributions, shares) = if total == 0.0 {
        match options.zero_total {
            ZeroTotalPolicy::Error => return Err(AggregateError::ZeroTotal { count }),
            ZeroTotalPolicy::Undefined => (vec![f64::NAN; count], ShareStatus::Undefined),
            ZeroTotalPolicy::Zero => (vec![0.0; count], ShareStatus::Zeroed),
        }
    } else {
        let shares: Vec<f64> = values
            .iter()
            .map(|v| round_to(v / total * 100.0, options.precision))
            .collect();
        if let Some(index) = shares.iter().position(|s| !s.is_finite()) {
            return Err(AggregateError::ShareOverflow { index, total });
        }
        (shares, ShareStatus::Defined)
    };

    Ok(Aggregation::Summary(Summary {
        count,
        total,
        mean,
        std_dev,
        contributions,
        shares,
    }))
}

/// Run [`aggregate`] and report what happened to `observer`.
pub fn analyze(
    values: &[f64],
    options: &AggregateOptions,
    observer: &dyn Observer,
) -> Result<Aggregation, AggregateError> {
    observer.notify(Event::new(
        Level::DEBUG,
        format!("Starting aggregation of {} values: {:?}", values.len(), values),
    ));

    match aggregate(values, options) {
        Ok(Aggregation::Empty) => {
            observer.notify(Event::new(
                Level::WARN,
                "Empty input provided; reporting empty result",
            ));
            Ok(Aggregation::Empty)
        }
        Ok(Aggregation::Summary(summary)) => {
            if summary.shares.is_defined() {
                observer.notify(Event::new(
                    Level::INFO,
                    format!(
                        "Aggregation successful. Total: {}, mean: {}, contributions: {:?}",
                        summary.total, summary.mean, summary.contributions
                    ),
                ));
            } else {
                observer.notify(Event::new(
                    Level::WARN,
                    format!(
                        "Total is zero; contributions reported as {}",
                        options.zero_total
                    ),
                ));
            }
            Ok(Aggregation::Summary(summary))
        }
        Err(e) => {
            observer.notify(Event::new(Level::ERROR, format!("Aggregation failed: {}", e)));
            Err(e)
        }
    }
}

/// Round `value` to `precision` decimal places, half away from zero.
///
/// Values too large to scale are returned unchanged; they carry no
/// fractional digits at that precision anyway.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.min(MAX_PRECISION) as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Arithmetic mean, or `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (denominator `n`), or `None` for empty input.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}
