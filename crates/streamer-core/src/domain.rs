//! Domain geometry handed to a field solver at initialization.

use crate::vector::Vector;

/// Cylindrical electrode with hemispherical ends.
///
/// Defined by the two axis endpoints and a radius. A point lies inside
/// the electrode when its distance to the axis segment is at most
/// `radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RodElectrode<const D: usize> {
    /// First axis endpoint (m).
    pub start: Vector<D>,
    /// Second axis endpoint (m); the tip facing the gap.
    pub end: Vector<D>,
    /// Rod radius (m).
    pub radius: f64,
}

impl<const D: usize> RodElectrode<D> {
    /// Distance from `point` to the rod axis segment.
    pub fn axis_distance(&self, point: &Vector<D>) -> f64 {
        let axis = self.end - self.start;
        let len2 = axis.dot(&axis);
        let t = if len2 > 0.0 {
            ((*point - self.start).dot(&axis) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        point.distance(&(self.start + axis * t))
    }

    /// True if `point` lies inside (or on the surface of) the electrode.
    pub fn contains(&self, point: &Vector<D>) -> bool {
        self.axis_distance(point) <= self.radius
    }

    /// Foot of the perpendicular from `point` onto the infinite line
    /// through the axis endpoints.
    ///
    /// A degenerate axis has no direction, so `point` is returned as is.
    pub fn project_onto_axis(&self, point: &Vector<D>) -> Vector<D> {
        let axis = self.end - self.start;
        let len2 = axis.dot(&axis);
        if len2 <= 0.0 {
            return *point;
        }
        let t = (*point - self.start).dot(&axis) / len2;
        self.start + axis * t
    }

    /// First point along `direction` from `point` that lies outside the
    /// electrode.
    ///
    /// Marches in steps of `radius / 64`. Returns `point` unchanged when
    /// it is already outside and `None` when no exit is found within the
    /// electrode's extent or the inputs are not usable.
    pub fn exit_point(&self, point: &Vector<D>, direction: &Vector<D>) -> Option<Vector<D>> {
        if !self.contains(point) {
            return Some(*point);
        }
        let dir = direction.normalized()?;
        if self.radius <= 0.0 {
            return None;
        }
        let step = self.radius / 64.0;
        let reach = self.start.distance(&self.end) + 2.0 * self.radius;
        let max_steps = (reach / step).ceil() as usize + 1;
        (1..=max_steps)
            .map(|k| *point + dir * (k as f64 * step))
            .find(|candidate| !self.contains(candidate))
    }
}

/// Geometry and discretization parameters for a field solver.
///
/// Corresponds to the solver's `initialize(domain_geometry,
/// grid_resolution, discretization_params, boundary_potential)` call.
#[derive(Clone, Debug, PartialEq)]
pub struct DomainConfig<const D: usize> {
    /// Physical extent of the domain along each axis (m).
    pub size: Vector<D>,
    /// Cells along each axis on the finest (uniform) grid.
    pub grid: [usize; D],
    /// Cells along each axis on the coarse grid (adaptive solvers).
    pub coarse_grid: [usize; D],
    /// Block size used by block-structured solvers.
    pub box_size: usize,
    /// Rod electrode held at `boundary_potential`.
    pub electrode: RodElectrode<D>,
    /// Applied electrode potential (V).
    pub boundary_potential: f64,
    /// Memory budget for the solver (GB).
    pub memory_limit_gb: f64,
}

impl<const D: usize> DomainConfig<D> {
    /// Grid spacing along each axis.
    pub fn spacing(&self) -> Vector<D> {
        let mut h = [0.0; D];
        for (axis, slot) in h.iter_mut().enumerate() {
            *slot = self.size[axis] / self.grid[axis] as f64;
        }
        Vector(h)
    }

    /// Smallest grid spacing over all axes.
    pub fn finest_spacing(&self) -> f64 {
        self.spacing().0.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Check structural invariants.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        for axis in 0..D {
            let len = self.size[axis];
            if !len.is_finite() || len <= 0.0 {
                return Err(format!("domain size along axis {axis} must be positive, got {len}"));
            }
            if self.grid[axis] < 2 {
                return Err(format!(
                    "grid along axis {axis} needs at least 2 cells, got {}",
                    self.grid[axis]
                ));
            }
            if self.coarse_grid[axis] == 0 || self.coarse_grid[axis] > self.grid[axis] {
                return Err(format!(
                    "coarse grid along axis {axis} must be in 1..={}, got {}",
                    self.grid[axis], self.coarse_grid[axis]
                ));
            }
        }
        if self.box_size == 0 {
            return Err("box_size must be at least 1".to_string());
        }
        let rod = &self.electrode;
        if !rod.radius.is_finite() || rod.radius <= 0.0 {
            return Err(format!("rod radius must be positive, got {}", rod.radius));
        }
        if !rod.start.is_finite() || !rod.end.is_finite() {
            return Err("rod endpoints must be finite".to_string());
        }
        if !self.boundary_potential.is_finite() {
            return Err("boundary potential must be finite".to_string());
        }
        if !self.memory_limit_gb.is_finite() || self.memory_limit_gb <= 0.0 {
            return Err(format!(
                "memory limit must be positive, got {} GB",
                self.memory_limit_gb
            ));
        }
        Ok(())
    }
}
