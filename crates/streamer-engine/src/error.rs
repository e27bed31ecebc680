//! Fatal simulation errors.

use std::error::Error;
use std::fmt;

use streamer_core::{RemovalCause, SolverError, StepIndex, TableError};

use crate::config::ConfigError;

/// Errors that end or prevent a run.
///
/// Per-streamer removals are not errors; they are reported in
/// [`StepReport::removed`](crate::StepReport::removed).
#[derive(Clone, Debug, PartialEq)]
pub enum SimulationError {
    /// Configuration failed validation.
    Config(ConfigError),
    /// The ionization table could not be loaded or is malformed.
    MalformedCorrelationTable(TableError),
    /// The field solver failed.
    Solver(SolverError),
    /// No streamer could be created from the initial solution.
    InitialSamplingFailed {
        /// Why the initial estimate was rejected.
        cause: RemovalCause,
    },
    /// The initial streamer could not be moved clear of the electrode.
    InitialPlacementFailed {
        /// Description of the problem.
        reason: String,
    },
    /// Every streamer was removed.
    AllStreamersExhausted {
        /// Step at which the last streamer died.
        step: StepIndex,
    },
    /// `step()` called before `initialize()`.
    NotInitialized,
    /// `initialize()` called twice.
    AlreadyInitialized,
    /// `step()` or `spawn_streamer()` called after termination.
    AlreadyTerminated,
    /// A spawned streamer had non-finite or out-of-range parameters.
    InvalidSpawn {
        /// Description of the problem.
        reason: String,
    },
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::MalformedCorrelationTable(e) => write!(f, "ionization table: {e}"),
            Self::Solver(e) => write!(f, "solver: {e}"),
            Self::InitialSamplingFailed { cause } => {
                write!(f, "initial streamer could not be placed: {cause}")
            }
            Self::InitialPlacementFailed { reason } => {
                write!(f, "initial streamer placement failed: {reason}")
            }
            Self::AllStreamersExhausted { step } => {
                write!(f, "all streamers removed by step {step}")
            }
            Self::NotInitialized => write!(f, "simulation not initialized"),
            Self::AlreadyInitialized => write!(f, "simulation already initialized"),
            Self::AlreadyTerminated => write!(f, "simulation already terminated"),
            Self::InvalidSpawn { reason } => write!(f, "invalid spawn: {reason}"),
        }
    }
}

impl Error for SimulationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::MalformedCorrelationTable(e) => Some(e),
            Self::Solver(e) => Some(e),
            Self::InitialSamplingFailed { cause } => Some(cause),
            _ => None,
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<TableError> for SimulationError {
    fn from(e: TableError) -> Self {
        Self::MalformedCorrelationTable(e)
    }
}

impl From<SolverError> for SimulationError {
    fn from(e: SolverError) -> Self {
        Self::Solver(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_source() {
        let err = SimulationError::from(TableError::TooFewPoints { count: 1 });
        assert_eq!(
            format!("{err}"),
            "ionization table: table needs at least 2 rows, got 1"
        );
        assert!(err.source().is_some());

        let err = SimulationError::AllStreamersExhausted { step: StepIndex(7) };
        assert_eq!(format!("{err}"), "all streamers removed by step 7");
        assert!(err.source().is_none());
    }

    #[test]
    fn solver_errors_convert() {
        match SimulationError::from(SolverError::NotInitialized) {
            SimulationError::Solver(SolverError::NotInitialized) => {}
            other => panic!("expected Solver(NotInitialized), got {other:?}"),
        }
    }
}
