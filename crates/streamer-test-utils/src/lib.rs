//! Test utilities and mock field solvers for streamer development.
//!
//! Provides [`ScriptedSolver`], a [`FieldSolver`] whose line samples come
//! from a closure and which records every call made to it, plus standard
//! fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{air_table, linear_profile, linear_script, test_domain_2d, AIR_TABLE_TEXT};

use std::cell::RefCell;

use streamer_core::{
    ChannelUpdate, DomainConfig, FieldMaximum, FieldQuantity, FieldSolver, IonizationTable,
    LineQuery, LineSample, SolutionTag, SolverError, Vector,
};

type Script<const D: usize> = Box<dyn Fn(&LineQuery<D>, usize) -> LineSample>;

/// Mock implementation of [`FieldSolver`].
///
/// `sample_line` calls the script with the query and the number of
/// non-initial solves performed so far (0 before the first step's solve,
/// 1 after it, ...). Every other call is recorded for assertions.
pub struct ScriptedSolver<const D: usize> {
    spacing: f64,
    script: Script<D>,
    maximum: FieldMaximum<D>,
    fail_solve_after: Option<usize>,
    initialized: Option<DomainConfig<D>>,
    table: Option<IonizationTable>,
    solves: Vec<f64>,
    updates: Vec<ChannelUpdate<D>>,
    exports: Vec<SolutionTag>,
    queries: RefCell<Vec<LineQuery<D>>>,
}

impl<const D: usize> ScriptedSolver<D> {
    /// Solver with finest spacing `spacing` and the given sampling script.
    pub fn new<F>(spacing: f64, script: F) -> Self
    where
        F: Fn(&LineQuery<D>, usize) -> LineSample + 'static,
    {
        Self {
            spacing,
            script: Box::new(script),
            maximum: FieldMaximum {
                value: 0.0,
                location: Vector::ZERO,
            },
            fail_solve_after: None,
            initialized: None,
            table: None,
            solves: Vec::new(),
            updates: Vec::new(),
            exports: Vec::new(),
            queries: RefCell::new(Vec::new()),
        }
    }

    /// Report `location` as the field maximum.
    pub fn with_field_maximum(mut self, value: f64, location: Vector<D>) -> Self {
        self.maximum = FieldMaximum { value, location };
        self
    }

    /// Fail every solve after `n` successful ones (the initial solve
    /// counts).
    pub fn failing_solve_after(mut self, n: usize) -> Self {
        self.fail_solve_after = Some(n);
        self
    }

    /// Number of timed solves (`dt > 0`) performed.
    pub fn step_solves(&self) -> usize {
        self.solves.iter().filter(|&&dt| dt > 0.0).count()
    }

    /// Every `dt` passed to `solve`, in order.
    pub fn solves(&self) -> &[f64] {
        &self.solves
    }

    /// Every conductivity update received, in order.
    pub fn updates(&self) -> &[ChannelUpdate<D>] {
        &self.updates
    }

    /// Every export tag received, in order.
    pub fn exports(&self) -> &[SolutionTag] {
        &self.exports
    }

    /// Domain passed to `initialize`, if it was called.
    pub fn domain(&self) -> Option<&DomainConfig<D>> {
        self.initialized.as_ref()
    }

    /// Table passed to `load_ionization_table`, if it was called.
    pub fn table(&self) -> Option<&IonizationTable> {
        self.table.as_ref()
    }

    /// Every line query issued so far.
    pub fn queries(&self) -> Vec<LineQuery<D>> {
        self.queries.borrow().clone()
    }
}

impl<const D: usize> FieldSolver<D> for ScriptedSolver<D> {
    fn initialize(&mut self, domain: &DomainConfig<D>) -> Result<(), SolverError> {
        self.initialized = Some(domain.clone());
        Ok(())
    }

    fn solve(&mut self, dt: f64) -> Result<(), SolverError> {
        if self.initialized.is_none() {
            return Err(SolverError::NotInitialized);
        }
        if let Some(n) = self.fail_solve_after {
            if self.solves.len() >= n {
                return Err(SolverError::NotConverged {
                    iterations: 0,
                    residual: f64::INFINITY,
                });
            }
        }
        self.solves.push(dt);
        Ok(())
    }

    fn sample_line(&self, quantity: FieldQuantity, query: &LineQuery<D>) -> LineSample {
        if quantity != FieldQuantity::FieldNorm {
            return LineSample::failed();
        }
        self.queries.borrow_mut().push(query.clone());
        (self.script)(query, self.step_solves())
    }

    fn locate_field_maximum(&self) -> FieldMaximum<D> {
        self.maximum
    }

    fn load_ionization_table(&mut self, table: &IonizationTable) -> Result<(), SolverError> {
        self.table = Some(table.clone());
        Ok(())
    }

    fn update_conductivity_channel(
        &mut self,
        update: &ChannelUpdate<D>,
    ) -> Result<(), SolverError> {
        self.updates.push(update.clone());
        Ok(())
    }

    fn export_solution(&mut self, tag: &SolutionTag) -> Result<(), SolverError> {
        self.exports.push(tag.clone());
        Ok(())
    }

    fn finest_grid_spacing(&self) -> f64 {
        self.spacing
    }
}
