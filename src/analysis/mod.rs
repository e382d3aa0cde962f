//! Numeric aggregation.
//!
//! Share-of-total aggregation over a numeric sequence plus the
//! small set of descriptive statistics reported next to it.

pub mod aggregator;

pub use aggregator::*;
