//! Typed errors for input parsing, statistics and the pipeline pre-flight checks.
//!
//! I/O and codec failures travel as [`anyhow::Error`] with context attached;
//! these enums cover the conditions callers may want to match on.

use std::path::PathBuf;

use thiserror::Error;

/// A flight record that is present but cannot be interpreted.
#[derive(Error, Debug)]
pub enum FlightError {
    /// The input document is not a JSON object keyed by flight id.
    #[error("flight document must be a JSON object of flight id -> record")]
    NotAnObject,

    /// A required field is present with a value of the wrong shape.
    #[error("flight '{id}': {reason}")]
    InvalidFlight { id: String, reason: String },
}

impl FlightError {
    pub fn invalid(id: &str, reason: impl Into<String>) -> Self {
        FlightError::InvalidFlight {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Arithmetic failure while finalizing one wing's statistics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Total sample weight of the wing is zero, so the mean is undefined.
    #[error("wing {wing}: total sample weight is zero")]
    ZeroWeight { wing: i64 },

    /// `sum_sq / weight - mean^2` is negative beyond rounding noise.
    #[error("wing {wing}: negative variance {variance:e}")]
    NegativeVariance { wing: i64, variance: f64 },

    /// Mean or variance is NaN or infinite (overflowing or NaN samples).
    #[error("wing {wing}: non-finite statistics (mean {mean}, variance {variance})")]
    NonFinite { wing: i64, mean: f64, variance: f64 },
}

impl StatsError {
    pub fn wing(&self) -> i64 {
        match self {
            StatsError::ZeroWeight { wing }
            | StatsError::NegativeVariance { wing, .. }
            | StatsError::NonFinite { wing, .. } => *wing,
        }
    }
}

/// Pre-flight checks run before any computation.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input file {} does not exist", .0.display())]
    MissingInputFile(PathBuf),

    #[error("output directory {} does not exist", .0.display())]
    InvalidOutputDirectory(PathBuf),
}
