//! The field-solver contract consumed by the streamer model.
//!
//! The solver owns its grid and conductivity field exclusively. The model
//! only issues read queries ([`FieldSolver::sample_line`],
//! [`FieldSolver::locate_field_maximum`]) and write requests
//! ([`FieldSolver::update_conductivity_channel`]).

use std::fmt;

use crate::channel::ChannelUpdate;
use crate::domain::DomainConfig;
use crate::error::SolverError;
use crate::id::StepIndex;
use crate::table::IonizationTable;
use crate::vector::Vector;

/// Scalar quantity that can be sampled along a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldQuantity {
    /// Electric field magnitude `|E|` (V/m).
    FieldNorm,
    /// Electric potential (V).
    Potential,
    /// Solver conductivity (S/m).
    Conductivity,
}

impl fmt::Display for FieldQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldNorm => write!(f, "E_norm"),
            Self::Potential => write!(f, "phi"),
            Self::Conductivity => write!(f, "sigma"),
        }
    }
}

/// A ray along which a quantity is sampled.
#[derive(Clone, Debug, PartialEq)]
pub struct LineQuery<const D: usize> {
    /// First sample point.
    pub start: Vector<D>,
    /// Unit direction of the ray.
    pub direction: Vector<D>,
    /// Distance from `start` to the last sample.
    pub max_distance: f64,
    /// Number of samples, both ends included.
    pub sample_count: usize,
}

impl<const D: usize> LineQuery<D> {
    /// Distances from `start` of each sample: `linspace(0, max_distance, n)`.
    pub fn coordinates(&self) -> Vec<f64> {
        match self.sample_count {
            0 => Vec::new(),
            1 => vec![0.0],
            n => {
                let last = (n - 1) as f64;
                (0..n)
                    .map(|i| self.max_distance * i as f64 / last)
                    .collect()
            }
        }
    }

    /// Sample points in physical space.
    pub fn points(&self) -> Vec<Vector<D>> {
        self.coordinates()
            .into_iter()
            .map(|s| self.start + self.direction * s)
            .collect()
    }
}

/// Result of [`FieldSolver::sample_line`].
///
/// `success == false` is a normal outcome (the ray left the domain or the
/// solver could not interpolate), not an error. Callers must check it.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSample {
    /// Distance of each sample from the ray start.
    pub coordinates: Vec<f64>,
    /// Sampled values, same length as `coordinates`.
    pub values: Vec<f64>,
    /// Whether every sample could be resolved.
    pub success: bool,
}

impl LineSample {
    /// Successful sample.
    pub fn new(coordinates: Vec<f64>, values: Vec<f64>) -> Self {
        Self {
            coordinates,
            values,
            success: true,
        }
    }

    /// Failed sample with no data.
    pub fn failed() -> Self {
        Self {
            coordinates: Vec::new(),
            values: Vec::new(),
            success: false,
        }
    }

    /// True if the sample succeeded and its data is consistent and finite.
    pub fn is_usable(&self) -> bool {
        self.success
            && !self.values.is_empty()
            && self.values.len() == self.coordinates.len()
            && self
                .coordinates
                .iter()
                .chain(self.values.iter())
                .all(|v| v.is_finite())
    }
}

/// Location and value of the field-magnitude maximum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldMaximum<const D: usize> {
    /// Maximum `|E|` (V/m).
    pub value: f64,
    /// Where it occurs.
    pub location: Vector<D>,
}

/// Identifies an exported solution snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct SolutionTag {
    /// Output path prefix.
    pub prefix: String,
    /// Step index (0 for the initial solve).
    pub step: StepIndex,
    /// Elapsed simulated time (s).
    pub time: f64,
}

impl fmt::Display for SolutionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:04}", self.prefix, self.step.0)
    }
}

/// External field (Poisson) solver.
///
/// # Contract
///
/// - `initialize()` is called once before anything else.
/// - `solve()` is blocking. It sees every conductivity update submitted
///   since the previous solve; the driver calls it only after all
///   streamers for the step were rasterized.
/// - Read queries never mutate solver state and reflect the most recent
///   `solve()`.
/// - Segments in a [`ChannelUpdate`] are applied in the order given
///   (ascending streamer id).
pub trait FieldSolver<const D: usize> {
    /// Set up the domain, grid, electrode and boundary potential.
    fn initialize(&mut self, domain: &DomainConfig<D>) -> Result<(), SolverError>;

    /// Advance the solution by `dt` seconds (0.0 for the initial solve).
    fn solve(&mut self, dt: f64) -> Result<(), SolverError>;

    /// Sample `quantity` along a ray.
    fn sample_line(&self, quantity: FieldQuantity, query: &LineQuery<D>) -> LineSample;

    /// Location and value of the largest `|E|` in the domain.
    fn locate_field_maximum(&self) -> FieldMaximum<D>;

    /// Store the ionization-rate table for solver-side use.
    fn load_ionization_table(&mut self, table: &IonizationTable) -> Result<(), SolverError>;

    /// Apply a conductivity-channel update.
    fn update_conductivity_channel(&mut self, update: &ChannelUpdate<D>)
        -> Result<(), SolverError>;

    /// Persist the current solution under `tag`.
    fn export_solution(&mut self, tag: &SolutionTag) -> Result<(), SolverError>;

    /// Smallest cell size of the current grid (m).
    fn finest_grid_spacing(&self) -> f64;
}
