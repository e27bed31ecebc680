//! Streamer: a reduced-order model of streamer discharges.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all streamer sub-crates. For most users, adding `streamer` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use streamer::prelude::*;
//!
//! let domain = DomainConfig {
//!     size: Vec2::new([30e-3, 30e-3]),
//!     grid: [40, 40],
//!     coarse_grid: [8, 8],
//!     box_size: 8,
//!     electrode: RodElectrode {
//!         start: Vec2::new([0.0, 0.0]),
//!         end: Vec2::new([0.0, 5e-3]),
//!         radius: 0.75e-3,
//!     },
//!     boundary_potential: -4e4,
//!     memory_limit_gb: 0.1,
//! };
//! let table = TableSource::Inline {
//!     fields: vec![0.0, 2.0e6, 3.0e6, 5.0e6, 1.0e7],
//!     rates: vec![-1.0e8, -2.0e7, 0.0, 1.0e9, 1.0e10],
//! };
//! let mut config = SimulationConfig::new(domain, table);
//! config.n_steps = 3;
//!
//! let solver = AxisymmetricSolver::builder()
//!     .export(ExportMode::Record)
//!     .build()?;
//! let mut sim = StreamerSimulation::new(config, solver)?;
//! let summary = sim.run()?;
//! assert_eq!(summary.steps, 3);
//! assert_eq!(sim.phase(), SimulationPhase::Terminated(Termination::Success));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `streamer-core` | Vectors, streamer state, tables, channel updates, solver trait |
//! | [`model`] | `streamer-model` | Length estimator, growth models, sampler, rasterizer |
//! | [`field`] | `streamer-field` | Reference axisymmetric field solver |
//! | [`engine`] | `streamer-engine` | Configuration and the step driver |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`streamer-core`).
///
/// Contains [`types::StreamerState`], [`types::IonizationTable`],
/// [`types::ChannelUpdate`] and the [`types::FieldSolver`] trait that
/// external solvers implement.
pub use streamer_core as types;

/// Streamer physics (`streamer-model`).
///
/// The [`model::HighFieldLengthEstimator`], the two
/// [`model::PropagationModel`] strategies and the
/// [`model::ConductivityRasterizer`].
pub use streamer_model as model;

/// Reference field solver (`streamer-field`).
///
/// [`field::AxisymmetricSolver`] solves the semi-implicit Poisson problem
/// on a uniform `(r, z)` grid.
pub use streamer_field as field;

/// Configuration and the step driver (`streamer-engine`).
///
/// [`engine::StreamerSimulation`] owns the streamer set and drives one
/// [`types::FieldSolver`].
pub use streamer_engine as engine;

/// Common imports for typical streamer usage.
///
/// ```rust
/// use streamer::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use streamer_core::{
        ChannelUpdate, DomainConfig, FieldQuantity, FieldSolver, IonizationTable, LineQuery,
        LineSample, RodElectrode, SolutionTag, StepIndex, StreamerId, StreamerSet, StreamerState,
        Vec2, Vec3, Vector,
    };

    // Errors
    pub use streamer_core::{RemovalCause, SolverError, TableError};

    // Model
    pub use streamer_model::{
        ChannelShape, ConductivityDriven, FeatureDriven, HighFieldLengthEstimator,
        PropagationModel,
    };

    // Reference solver
    pub use streamer_field::{AxisymmetricSolver, ExportMode};

    // Engine
    pub use streamer_engine::{
        ConfigError, PropagationModelConfig, RunSummary, SimulationConfig, SimulationError,
        SimulationPhase, StepReport, StreamerSimulation, TableSource, Termination,
        ThresholdConfig,
    };
}
