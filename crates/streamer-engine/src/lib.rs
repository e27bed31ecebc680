//! Step driver for the streamer propagation model.
//!
//! Provides [`StreamerSimulation`], which owns a
//! [`FieldSolver`](streamer_core::FieldSolver), places the initial
//! streamer from the zero-time solution, and then alternates model
//! updates with field solves until the configured step count is reached
//! or every streamer has been removed.
//!
//! Configuration lives in [`SimulationConfig`]; fatal failures are
//! [`SimulationError`]s, per-streamer removals are reported in each
//! [`StepReport`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod error;
pub mod metrics;

pub use config::{ConfigError, PropagationModelConfig, SimulationConfig, TableSource, ThresholdConfig};
pub use driver::{SimulationPhase, StreamerSimulation, Termination};
pub use error::SimulationError;
pub use metrics::{RunSummary, StepMetrics, StepReport};
