//! Core types and traits for the streamer propagation model.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! data shared by every other crate in the workspace: streamer state and
//! identifiers, the geometry vector type, the ionization-rate table, the
//! conductivity-channel update handed to a field solver, error types, and
//! the [`FieldSolver`] contract itself.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod channel;
pub mod domain;
pub mod error;
pub mod id;
pub mod streamer;
pub mod table;
pub mod traits;
pub mod vector;

pub use channel::{ChannelProfile, ChannelSegment, ChannelUpdate, RadialWeight};
pub use domain::{DomainConfig, RodElectrode};
pub use error::{RemovalCause, SolverError, TableError};
pub use id::{StepIndex, StreamerId, StreamerIdAllocator};
pub use streamer::{Branching, StreamerSet, StreamerState};
pub use table::IonizationTable;
pub use traits::{
    FieldMaximum, FieldQuantity, FieldSolver, LineQuery, LineSample, SolutionTag,
};
pub use vector::{Vec2, Vec3, Vector};
