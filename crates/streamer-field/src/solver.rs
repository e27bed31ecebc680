//! Finite-volume Poisson solver with semi-implicit charge relaxation.
//!
//! Each `solve(dt)` computes the potential from
//!
//! ```text
//! ∇·((1 + dt·σ/ε0) ∇φ) = −ρ/ε0
//! ```
//!
//! and then advances the space charge with the resulting currents,
//! `ρ += dt·∇·(σ∇φ)`. With `dt == 0` this is the electrostatic problem.
//! The rod electrode cells are held at the boundary potential, the top
//! plane `z = Lz` is grounded, and the bottom plane and outer radius are
//! insulating.

use std::path::Path;

use tracing::debug;

use streamer_core::{
    ChannelSegment, ChannelUpdate, DomainConfig, FieldMaximum, FieldQuantity, FieldSolver,
    IonizationTable, LineQuery, LineSample, RodElectrode, SolutionTag, SolverError, Vec2,
};

use crate::export::{write_text_snapshot, ExportMode};
use crate::grid::AxisymmetricGrid;

/// Vacuum permittivity (F/m).
pub const EPSILON_0: f64 = 8.854_187_812_8e-12;

/// Bytes held per cell: potential, field, conductivity, charge,
/// face coefficients and the electrode mask.
const BYTES_PER_CELL: f64 = 8.0 * 7.0 + 1.0;

/// State that exists only after `initialize()`.
#[derive(Clone, Debug)]
struct Discretization {
    grid: AxisymmetricGrid,
    electrode: RodElectrode<2>,
    boundary_potential: f64,
    fixed: Vec<bool>,
    potential: Vec<f64>,
    field_norm: Vec<f64>,
    conductivity: Vec<f64>,
    charge: Vec<f64>,
}

/// Reference axisymmetric `(r, z)` field solver.
///
/// Intended for demos and end-to-end tests on modest grids: it uses a
/// single uniform grid and successive over-relaxation.
///
/// Constructed via the builder pattern: [`AxisymmetricSolver::builder`].
#[derive(Clone, Debug)]
pub struct AxisymmetricSolver {
    omega: f64,
    tolerance: f64,
    max_iterations: usize,
    export: ExportMode,
    state: Option<Discretization>,
    table: Option<IonizationTable>,
    exported: Vec<SolutionTag>,
    solves: usize,
}

/// Builder for [`AxisymmetricSolver`].
#[derive(Clone, Debug)]
pub struct AxisymmetricSolverBuilder {
    omega: f64,
    tolerance: f64,
    max_iterations: usize,
    export: ExportMode,
}

impl AxisymmetricSolver {
    /// Create a new builder.
    pub fn builder() -> AxisymmetricSolverBuilder {
        AxisymmetricSolverBuilder {
            omega: 1.8,
            tolerance: 1e-8,
            max_iterations: 50_000,
            export: ExportMode::Record,
        }
    }

    /// Grid, once initialized.
    pub fn grid(&self) -> Option<&AxisymmetricGrid> {
        self.state.as_ref().map(|s| &s.grid)
    }

    /// Cell-centred potential, once initialized.
    pub fn potential(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.potential.as_slice())
    }

    /// Cell-centred conductivity, once initialized.
    pub fn conductivity(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.conductivity.as_slice())
    }

    /// Ionization table passed by the model, if any.
    pub fn ionization_table(&self) -> Option<&IonizationTable> {
        self.table.as_ref()
    }

    /// Tags of every exported snapshot, in order.
    pub fn exported(&self) -> &[SolutionTag] {
        &self.exported
    }

    /// Number of completed solves.
    pub fn solve_count(&self) -> usize {
        self.solves
    }
}

impl Default for AxisymmetricSolver {
    fn default() -> Self {
        let b = Self::builder();
        Self {
            omega: b.omega,
            tolerance: b.tolerance,
            max_iterations: b.max_iterations,
            export: b.export,
            state: None,
            table: None,
            exported: Vec::new(),
            solves: 0,
        }
    }
}

impl AxisymmetricSolverBuilder {
    /// Set the over-relaxation factor in `(0, 2)` (default: 1.8).
    pub fn omega(mut self, omega: f64) -> Self {
        self.omega = omega;
        self
    }

    /// Set the convergence tolerance (default: 1e-8).
    ///
    /// Iteration stops once the largest potential change in a sweep is
    /// below `tolerance · |φ_bc|`.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the sweep limit (default: 50 000).
    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Set how snapshots are exported (default: [`ExportMode::Record`]).
    pub fn export(mut self, mode: ExportMode) -> Self {
        self.export = mode;
        self
    }

    /// Build the solver, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `omega` is outside `(0, 2)`, `tolerance` is not
    /// positive, or `max_iterations` is zero.
    pub fn build(self) -> Result<AxisymmetricSolver, String> {
        if !(self.omega > 0.0 && self.omega < 2.0) {
            return Err(format!("omega must be in (0, 2), got {}", self.omega));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(format!(
                "tolerance must be finite and > 0, got {}",
                self.tolerance
            ));
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".to_string());
        }
        Ok(AxisymmetricSolver {
            omega: self.omega,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            export: self.export,
            state: None,
            table: None,
            exported: Vec::new(),
            solves: 0,
        })
    }
}

// ── Discretization ─────────────────────────────────────────────

/// Stencil weights of one cell: west, east, south, north, and the
/// grounded-top contribution to the diagonal.
#[derive(Clone, Copy, Debug, Default)]
struct Stencil {
    w: f64,
    e: f64,
    s: f64,
    n: f64,
    ground: f64,
}

impl Stencil {
    fn diagonal(&self) -> f64 {
        self.w + self.e + self.s + self.n + self.ground
    }
}

impl Discretization {
    fn new(domain: &DomainConfig<2>) -> Self {
        let grid = AxisymmetricGrid::from_domain(domain);
        let mut fixed = vec![false; grid.len()];
        let mut potential = vec![0.0; grid.len()];
        for j in 0..grid.nz() {
            for i in 0..grid.nr() {
                if domain.electrode.contains(&grid.center(i, j)) {
                    let k = grid.index(i, j);
                    fixed[k] = true;
                    potential[k] = domain.boundary_potential;
                }
            }
        }
        Self {
            grid,
            electrode: domain.electrode,
            boundary_potential: domain.boundary_potential,
            fixed,
            potential,
            field_norm: vec![0.0; grid.len()],
            conductivity: vec![0.0; grid.len()],
            charge: vec![0.0; grid.len()],
        }
    }

    /// Face-weighted stencil of cell `(i, j)` for the coefficient field
    /// `coef` (relative permittivity or conductivity).
    fn stencil(&self, coef: &[f64], i: usize, j: usize) -> Stencil {
        let g = &self.grid;
        let k = g.index(i, j);
        let r = g.r_center(i);
        let radial = 1.0 / (r * g.dr() * g.dr());
        let axial = 1.0 / (g.dz() * g.dz());
        let face = |a: f64, b: f64| 0.5 * (a + b);

        let mut st = Stencil::default();
        if i > 0 {
            st.w = radial * (i as f64 * g.dr()) * face(coef[k], coef[k - 1]);
        }
        if i + 1 < g.nr() {
            st.e = radial * ((i + 1) as f64 * g.dr()) * face(coef[k], coef[k + 1]);
        }
        if j > 0 {
            st.s = axial * face(coef[k], coef[k - g.nr()]);
        }
        if j + 1 < g.nz() {
            st.n = axial * face(coef[k], coef[k + g.nr()]);
        } else {
            // Dirichlet φ = 0 half a cell above the last centre.
            st.ground = 2.0 * axial * coef[k];
        }
        st
    }

    /// `Σ a_n φ_n` over the four neighbours.
    fn neighbour_sum(&self, st: &Stencil, i: usize, j: usize) -> f64 {
        let g = &self.grid;
        let k = g.index(i, j);
        let phi = &self.potential;
        let mut sum = 0.0;
        if st.w != 0.0 {
            sum += st.w * phi[k - 1];
        }
        if st.e != 0.0 {
            sum += st.e * phi[k + 1];
        }
        if st.s != 0.0 {
            sum += st.s * phi[k - g.nr()];
        }
        if st.n != 0.0 {
            sum += st.n * phi[k + g.nr()];
        }
        sum
    }

    fn solve_potential(
        &mut self,
        eps: &[f64],
        omega: f64,
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<usize, SolverError> {
        let g = self.grid;
        let stencils: Vec<Stencil> = (0..g.len())
            .map(|k| self.stencil(eps, k % g.nr(), k / g.nr()))
            .collect();
        let rhs: Vec<f64> = self.charge.iter().map(|q| q / EPSILON_0).collect();
        let scale = self.boundary_potential.abs().max(1.0);

        let mut change = f64::INFINITY;
        for iteration in 1..=max_iterations {
            change = 0.0f64;
            for j in 0..g.nz() {
                for i in 0..g.nr() {
                    let k = g.index(i, j);
                    if self.fixed[k] {
                        continue;
                    }
                    let st = &stencils[k];
                    let target = (self.neighbour_sum(st, i, j) + rhs[k]) / st.diagonal();
                    let delta = omega * (target - self.potential[k]);
                    self.potential[k] += delta;
                    change = change.max(delta.abs());
                }
            }
            if !change.is_finite() {
                break;
            }
            if change <= tolerance * scale {
                return Ok(iteration);
            }
        }
        Err(SolverError::NotConverged {
            iterations: max_iterations,
            residual: change / scale,
        })
    }

    /// `ρ += dt·∇·(σ∇φ)` with the freshly solved potential.
    fn relax_charge(&mut self, dt: f64) {
        let g = self.grid;
        let sigma = self.conductivity.clone();
        for j in 0..g.nz() {
            for i in 0..g.nr() {
                let k = g.index(i, j);
                if self.fixed[k] {
                    continue;
                }
                let st = self.stencil(&sigma, i, j);
                let div = self.neighbour_sum(&st, i, j) - st.diagonal() * self.potential[k];
                self.charge[k] += dt * div;
            }
        }
    }

    /// Cell-centred `|E|` by central differences; zero inside the rod.
    fn update_field(&mut self) {
        let g = self.grid;
        let phi = &self.potential;
        for j in 0..g.nz() {
            for i in 0..g.nr() {
                let k = g.index(i, j);
                if self.fixed[k] {
                    self.field_norm[k] = 0.0;
                    continue;
                }
                // Mirror at the axis, insulating outer wall and bottom,
                // grounded top.
                let west = if i > 0 { phi[k - 1] } else { phi[k] };
                let east = if i + 1 < g.nr() { phi[k + 1] } else { phi[k] };
                let south = if j > 0 { phi[k - g.nr()] } else { phi[k] };
                let north = if j + 1 < g.nz() { phi[k + g.nr()] } else { -phi[k] };
                let er = (east - west) / (2.0 * g.dr());
                let ez = (north - south) / (2.0 * g.dz());
                self.field_norm[k] = (er * er + ez * ez).sqrt();
            }
        }
    }

    /// Paint one segment with `σ_cell = max(σ_cell, contribution)`.
    fn paint(&mut self, segment: &ChannelSegment<2>) {
        let g = self.grid;
        let reach = segment.radius.max(segment.prev_radius);
        let (lo, hi) = match &segment.profile {
            Some(profile) => {
                let end = profile.origin
                    + profile.direction * (profile.spacing * profile.values.len() as f64);
                (profile.origin, end)
            }
            None => (segment.prev_position, segment.position),
        };
        let r_max = lo[0].abs().max(hi[0].abs()) + reach;
        let z_min = lo[1].min(hi[1]) - reach;
        let z_max = lo[1].max(hi[1]) + reach;
        let i_end = ((r_max / g.dr()).ceil() as usize + 1).min(g.nr());
        let j_start = ((z_min / g.dz()).floor().max(0.0)) as usize;
        let j_end = ((z_max / g.dz()).ceil().max(0.0) as usize + 1).min(g.nz());

        for j in j_start..j_end {
            for i in 0..i_end {
                let k = g.index(i, j);
                if self.fixed[k] {
                    continue;
                }
                let c = g.center(i, j);
                let value = match &segment.profile {
                    Some(profile) => profile.conductivity_at(&c),
                    None => head_disk_conductivity(segment, &c),
                };
                if value > self.conductivity[k] {
                    self.conductivity[k] = value;
                }
            }
        }
    }

    fn maximum(&self) -> FieldMaximum<2> {
        let g = &self.grid;
        let mut best = FieldMaximum {
            value: 0.0,
            location: g.center(0, 0),
        };
        for k in 0..g.len() {
            if !self.fixed[k] && self.field_norm[k] > best.value {
                best = FieldMaximum {
                    value: self.field_norm[k],
                    location: g.center(k % g.nr(), k / g.nr()),
                };
            }
        }
        best
    }

    fn quantity(&self, quantity: FieldQuantity) -> &[f64] {
        match quantity {
            FieldQuantity::FieldNorm => &self.field_norm,
            FieldQuantity::Potential => &self.potential,
            FieldQuantity::Conductivity => &self.conductivity,
        }
    }
}

/// Line conductance spread uniformly over the head disk cross-section.
///
/// Cells ahead of the head, along the direction of travel, are not
/// painted.
fn head_disk_conductivity(segment: &ChannelSegment<2>, point: &Vec2) -> f64 {
    let radius = segment.radius.max(segment.prev_radius);
    if radius <= 0.0 {
        return 0.0;
    }
    if let Some(dir) = (segment.position - segment.prev_position).normalized() {
        if (*point - segment.position).dot(&dir) > 0.0 {
            return 0.0;
        }
    }
    segment
        .head_disk_at(point)
        .map_or(0.0, |line| line / (std::f64::consts::PI * radius * radius))
}

// ── FieldSolver ────────────────────────────────────────────────

impl FieldSolver<2> for AxisymmetricSolver {
    fn initialize(&mut self, domain: &DomainConfig<2>) -> Result<(), SolverError> {
        domain
            .validate()
            .map_err(|reason| SolverError::InvalidGeometry { reason })?;
        let cells = (domain.grid[0] * domain.grid[1]) as f64;
        let needed_gb = cells * BYTES_PER_CELL / 1e9;
        if needed_gb > domain.memory_limit_gb {
            return Err(SolverError::InvalidGeometry {
                reason: format!(
                    "grid needs {needed_gb:.3} GB, above the {:.3} GB limit",
                    domain.memory_limit_gb
                ),
            });
        }
        let disc = Discretization::new(domain);
        if !disc.fixed.iter().any(|&f| f) {
            return Err(SolverError::InvalidGeometry {
                reason: "rod electrode covers no cell centre".to_string(),
            });
        }
        debug!(
            nr = disc.grid.nr(),
            nz = disc.grid.nz(),
            rod_radius = disc.electrode.radius,
            "initialized axisymmetric grid"
        );
        self.state = Some(disc);
        self.solves = 0;
        Ok(())
    }

    fn solve(&mut self, dt: f64) -> Result<(), SolverError> {
        let (omega, tolerance, max_iterations) = (self.omega, self.tolerance, self.max_iterations);
        let disc = self.state.as_mut().ok_or(SolverError::NotInitialized)?;
        let dt = dt.max(0.0);
        let eps: Vec<f64> = disc
            .conductivity
            .iter()
            .map(|s| 1.0 + dt * s / EPSILON_0)
            .collect();
        let iterations = disc.solve_potential(&eps, omega, tolerance, max_iterations)?;
        if dt > 0.0 {
            disc.relax_charge(dt);
        }
        disc.update_field();
        self.solves += 1;
        debug!(dt, iterations, "potential solved");
        Ok(())
    }

    fn sample_line(&self, quantity: FieldQuantity, query: &LineQuery<2>) -> LineSample {
        let Some(disc) = self.state.as_ref() else {
            return LineSample::failed();
        };
        let data = disc.quantity(quantity);
        let coordinates = query.coordinates();
        let mut values = Vec::with_capacity(coordinates.len());
        for point in query.points() {
            match disc.grid.interpolate(data, &point) {
                Some(v) => values.push(v),
                None => return LineSample::failed(),
            }
        }
        LineSample::new(coordinates, values)
    }

    fn locate_field_maximum(&self) -> FieldMaximum<2> {
        match &self.state {
            Some(disc) => disc.maximum(),
            None => FieldMaximum {
                value: 0.0,
                location: Vec2::ZERO,
            },
        }
    }

    fn load_ionization_table(&mut self, table: &IonizationTable) -> Result<(), SolverError> {
        if table.is_empty() {
            return Err(SolverError::InvalidTable {
                reason: "empty table".to_string(),
            });
        }
        self.table = Some(table.clone());
        Ok(())
    }

    fn update_conductivity_channel(
        &mut self,
        update: &ChannelUpdate<2>,
    ) -> Result<(), SolverError> {
        let disc = self.state.as_mut().ok_or(SolverError::NotInitialized)?;
        for segment in update.segments() {
            let finite = segment.position.is_finite()
                && segment.prev_position.is_finite()
                && segment.radius.is_finite()
                && segment.prev_radius.is_finite()
                && segment.conductivity.is_finite()
                && segment.prev_conductivity.is_finite();
            if !finite {
                return Err(SolverError::InvalidUpdate {
                    reason: format!("segment for streamer {} is not finite", segment.id),
                });
            }
            disc.paint(segment);
        }
        Ok(())
    }

    fn export_solution(&mut self, tag: &SolutionTag) -> Result<(), SolverError> {
        let disc = self.state.as_ref().ok_or(SolverError::NotInitialized)?;
        match &self.export {
            ExportMode::Discard => {}
            ExportMode::Record => self.exported.push(tag.clone()),
            ExportMode::Text => {
                let path = format!("{tag}.txt");
                write_text_snapshot(
                    Path::new(&path),
                    tag,
                    &disc.grid,
                    &disc.potential,
                    &disc.field_norm,
                    &disc.conductivity,
                )
                .map_err(|e| SolverError::Export {
                    tag: tag.to_string(),
                    reason: e.to_string(),
                })?;
                self.exported.push(tag.clone());
            }
        }
        Ok(())
    }

    fn finest_grid_spacing(&self) -> f64 {
        self.state
            .as_ref()
            .map_or(0.0, |s| s.grid.dr().min(s.grid.dz()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamer_core::{StepIndex, StreamerId};
    use streamer_test_utils::test_domain_2d;

    fn small_domain() -> DomainConfig<2> {
        let mut d = test_domain_2d();
        d.grid = [24, 24];
        d.coarse_grid = [8, 8];
        d
    }

    fn solved() -> AxisymmetricSolver {
        let mut s = AxisymmetricSolver::default();
        s.initialize(&small_domain()).unwrap();
        s.solve(0.0).unwrap();
        s
    }

    #[test]
    fn builder_rejects_bad_settings() {
        assert!(AxisymmetricSolver::builder().omega(2.0).build().is_err());
        assert!(AxisymmetricSolver::builder().tolerance(0.0).build().is_err());
        assert!(AxisymmetricSolver::builder().max_iterations(0).build().is_err());
        assert!(AxisymmetricSolver::builder().build().is_ok());
    }

    #[test]
    fn queries_before_initialize() {
        let mut s = AxisymmetricSolver::default();
        assert_eq!(s.solve(0.0), Err(SolverError::NotInitialized));
        let q = LineQuery {
            start: Vec2::new([0.0, 10e-3]),
            direction: Vec2::unit(1),
            max_distance: 1e-3,
            sample_count: 3,
        };
        assert!(!s.sample_line(FieldQuantity::FieldNorm, &q).success);
        assert_eq!(s.finest_grid_spacing(), 0.0);
    }

    #[test]
    fn memory_limit_is_enforced() {
        let mut d = small_domain();
        d.memory_limit_gb = 1e-9;
        let mut s = AxisymmetricSolver::default();
        match s.initialize(&d) {
            Err(SolverError::InvalidGeometry { reason }) => assert!(reason.contains("GB")),
            other => panic!("expected InvalidGeometry, got {other:?}"),
        }
    }

    #[test]
    fn potential_obeys_maximum_principle() {
        let s = solved();
        let phi = s.potential().unwrap();
        // φ_bc is negative and the top is grounded.
        assert!(phi.iter().all(|&p| (-4e4 - 1e-3..=1e-3).contains(&p)));
    }

    #[test]
    fn field_maximum_sits_near_rod_tip() {
        let s = solved();
        let max = s.locate_field_maximum();
        assert!(max.value > 1e6, "max |E| = {}", max.value);
        assert!(max.location[0] < 3e-3, "r = {}", max.location[0]);
        assert!(max.location[1] < 8e-3, "z = {}", max.location[1]);
    }

    #[test]
    fn conducting_channel_carries_potential() {
        let mut s = solved();
        let before = s.potential().unwrap().to_vec();
        let mut update = ChannelUpdate::new(StepIndex(1));
        update.push(ChannelSegment {
            id: StreamerId(0),
            prev_position: Vec2::new([0.0, 5e-3]),
            position: Vec2::new([0.0, 12e-3]),
            prev_radius: 2e-3,
            radius: 2e-3,
            prev_conductivity: 1e-4,
            conductivity: 1e-4,
            first_step: false,
            profile: None,
        });
        s.update_conductivity_channel(&update).unwrap();
        s.solve(1e-9).unwrap();
        let g = *s.grid().unwrap();
        let inside = g.index(0, (10e-3 / g.dz()) as usize);
        let after = s.potential().unwrap();
        assert!(s.conductivity().unwrap()[inside] > 0.0);
        // The channel is pulled toward the rod potential.
        assert!(after[inside] < before[inside]);
    }

    #[test]
    fn head_disk_is_not_painted_ahead_of_head() {
        let mut s = solved();
        let mut update = ChannelUpdate::new(StepIndex(1));
        update.push(ChannelSegment {
            id: StreamerId(0),
            prev_position: Vec2::new([0.0, 8e-3]),
            position: Vec2::new([0.0, 12e-3]),
            prev_radius: 2e-3,
            radius: 2e-3,
            prev_conductivity: 1e-4,
            conductivity: 1e-4,
            first_step: false,
            profile: None,
        });
        s.update_conductivity_channel(&update).unwrap();
        let g = *s.grid().unwrap();
        let sigma = s.conductivity().unwrap();
        // Cell centres sit at (j + 1/2)·dz = 10.625 mm and 13.125 mm.
        assert!(sigma[g.index(0, 8)] > 0.0);
        assert_eq!(sigma[g.index(0, 10)], 0.0);
    }
}
