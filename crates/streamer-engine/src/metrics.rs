//! Per-step reports and run summaries.
//!
//! [`StepMetrics`] captures wall-clock timing for a single step. The
//! driver returns it inside a [`StepReport`] from every successful
//! `step()`, and [`RunSummary`] aggregates a complete run.

use streamer_core::{RemovalCause, StepIndex, StreamerId};

/// Timing collected during a single step.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step.
    pub total_us: u64,
    /// Sampling, length estimation and state updates for all streamers.
    pub update_us: u64,
    /// Building the channel update.
    pub rasterize_us: u64,
    /// Conductivity update plus field solve.
    pub solve_us: u64,
    /// Exporting the solution.
    pub export_us: u64,
}

/// Outcome of one successful step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// The step just completed.
    pub step: StepIndex,
    /// Simulated time after the step (s).
    pub time: f64,
    /// Streamers still alive.
    pub live: usize,
    /// Streamers removed during this step, in ascending id order.
    pub removed: Vec<(StreamerId, RemovalCause)>,
    /// Segments submitted to the solver.
    pub segments: usize,
    /// Timing for this step.
    pub metrics: StepMetrics,
}

/// Result of a run that reached its configured step count.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Steps completed.
    pub steps: u64,
    /// Final simulated time (s).
    pub time: f64,
    /// Streamers alive at the end.
    pub live: usize,
    /// Streamers removed over the whole run.
    pub removed: usize,
    /// Sum of all step wall-clock times (µs).
    pub total_us: u64,
}
