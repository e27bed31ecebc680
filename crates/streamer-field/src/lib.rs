//! Reference axisymmetric field solver for the streamer model.
//!
//! [`AxisymmetricSolver`] implements
//! [`FieldSolver<2>`](streamer_core::FieldSolver) on a uniform `(r, z)`
//! grid with a rod electrode on the axis. The potential comes from a
//! finite-volume Poisson equation solved by SOR with warm start; painted
//! channel conductivity relaxes space charge semi-implicitly between
//! solves. Snapshots can be kept in memory or written as plain text
//! (see [`ExportMode`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod export;
pub mod grid;
pub mod solver;

pub use export::{write_text_snapshot, ExportMode};
pub use grid::AxisymmetricGrid;
pub use solver::{AxisymmetricSolver, AxisymmetricSolverBuilder, EPSILON_0};
