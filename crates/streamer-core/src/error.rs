//! Error types shared across the streamer workspace.
//!
//! Organized by who raises them: per-streamer removal causes (local,
//! non-fatal), field-solver failures, and ionization-table loading.

use std::error::Error;
use std::fmt;

/// Why a streamer was removed during a step.
///
/// Removal is local: only the affected streamer is marked dead and the
/// run continues with the rest.
#[derive(Clone, Debug, PartialEq)]
pub enum RemovalCause {
    /// The ray ahead of the tip left the solved domain or the solver
    /// could not interpolate a value.
    SamplingFailure,
    /// The high-field length fell below the configured floor.
    FeatureBelowFloor {
        /// The offending (corrected, raw) length in metres.
        length: f64,
        /// The configured `L_E_min`.
        floor: f64,
    },
}

impl fmt::Display for RemovalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SamplingFailure => write!(f, "could not sample field ahead of tip"),
            Self::FeatureBelowFloor { length, floor } => {
                write!(f, "high-field length {length:.3e} m below floor {floor:.3e} m")
            }
        }
    }
}

impl Error for RemovalCause {}

/// Errors reported by a [`FieldSolver`](crate::FieldSolver).
#[derive(Clone, Debug, PartialEq)]
pub enum SolverError {
    /// A query or solve was issued before `initialize()`.
    NotInitialized,
    /// The iterative solve did not reach its tolerance.
    NotConverged {
        /// Iterations performed.
        iterations: usize,
        /// Final residual (solver-specific norm).
        residual: f64,
    },
    /// Domain geometry rejected at initialization.
    InvalidGeometry {
        /// Description of the problem.
        reason: String,
    },
    /// A conductivity update could not be applied.
    InvalidUpdate {
        /// Description of the problem.
        reason: String,
    },
    /// The ionization table was rejected by the solver.
    InvalidTable {
        /// Description of the problem.
        reason: String,
    },
    /// Exporting a solution snapshot failed.
    Export {
        /// The tag that was being written.
        tag: String,
        /// Underlying I/O message.
        reason: String,
    },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "field solver not initialized"),
            Self::NotConverged {
                iterations,
                residual,
            } => write!(
                f,
                "field solve did not converge after {iterations} iterations (residual {residual:.3e})"
            ),
            Self::InvalidGeometry { reason } => write!(f, "invalid domain geometry: {reason}"),
            Self::InvalidUpdate { reason } => write!(f, "invalid conductivity update: {reason}"),
            Self::InvalidTable { reason } => write!(f, "ionization table rejected: {reason}"),
            Self::Export { tag, reason } => write!(f, "export of '{tag}' failed: {reason}"),
        }
    }
}

impl Error for SolverError {}

/// Errors from loading or validating an ionization-rate table.
#[derive(Clone, Debug, PartialEq)]
pub enum TableError {
    /// The table file could not be read.
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O message.
        reason: String,
    },
    /// A line could not be parsed as two numbers.
    Parse {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        reason: String,
    },
    /// Field and rate columns have different lengths.
    LengthMismatch {
        /// Number of field breakpoints.
        fields: usize,
        /// Number of rate values.
        rates: usize,
    },
    /// Fewer than two breakpoints.
    TooFewPoints {
        /// Number of points found.
        count: usize,
    },
    /// A value is NaN or infinite.
    NonFinite {
        /// 0-based row index.
        index: usize,
    },
    /// Field breakpoints are not strictly increasing, or the rates are
    /// not monotonic.
    NonMonotonic {
        /// 0-based row index where monotonicity breaks.
        index: usize,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, reason } => write!(f, "cannot read table '{path}': {reason}"),
            Self::Parse { line, reason } => write!(f, "line {line}: {reason}"),
            Self::LengthMismatch { fields, rates } => {
                write!(f, "{fields} field breakpoints but {rates} rate values")
            }
            Self::TooFewPoints { count } => {
                write!(f, "table needs at least 2 rows, got {count}")
            }
            Self::NonFinite { index } => write!(f, "non-finite value in row {index}"),
            Self::NonMonotonic { index } => write!(f, "table not monotonic at row {index}"),
        }
    }
}

impl Error for TableError {}
