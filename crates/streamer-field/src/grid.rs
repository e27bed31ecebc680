//! Uniform cell-centred `(r, z)` grid.

use streamer_core::{DomainConfig, Vec2};

/// A uniform axisymmetric grid.
///
/// Cell `(i, j)` has its centre at `((i + ½)·dr, (j + ½)·dz)`. Cells are
/// stored row-major in `z`: index `j·nr + i`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisymmetricGrid {
    nr: usize,
    nz: usize,
    dr: f64,
    dz: f64,
}

impl AxisymmetricGrid {
    /// Grid covering `domain.size` with `domain.grid` cells.
    pub fn from_domain(domain: &DomainConfig<2>) -> Self {
        let [nr, nz] = domain.grid;
        Self {
            nr,
            nz,
            dr: domain.size[0] / nr as f64,
            dz: domain.size[1] / nz as f64,
        }
    }

    /// Cells along `r`.
    pub fn nr(&self) -> usize {
        self.nr
    }

    /// Cells along `z`.
    pub fn nz(&self) -> usize {
        self.nz
    }

    /// Radial spacing.
    pub fn dr(&self) -> f64 {
        self.dr
    }

    /// Axial spacing.
    pub fn dz(&self) -> f64 {
        self.dz
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.nr * self.nz
    }

    /// True for a grid without cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of cell `(i, j)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        j * self.nr + i
    }

    /// Radius of the centre of column `i`.
    #[inline]
    pub fn r_center(&self, i: usize) -> f64 {
        (i as f64 + 0.5) * self.dr
    }

    /// Height of the centre of row `j`.
    #[inline]
    pub fn z_center(&self, j: usize) -> f64 {
        (j as f64 + 0.5) * self.dz
    }

    /// Centre of cell `(i, j)`.
    pub fn center(&self, i: usize, j: usize) -> Vec2 {
        Vec2::new([self.r_center(i), self.z_center(j)])
    }

    /// Cell containing `point`, if it lies inside the domain.
    pub fn cell_of(&self, point: &Vec2) -> Option<(usize, usize)> {
        let (r, z) = (point[0].abs(), point[1]);
        if !(r.is_finite() && z.is_finite()) || z < 0.0 {
            return None;
        }
        let i = (r / self.dr) as usize;
        let j = (z / self.dz) as usize;
        (i < self.nr && j < self.nz).then_some((i, j))
    }

    /// Bilinear interpolation of cell-centred `values` at `point`.
    ///
    /// Negative radii are mirrored onto the axis. Returns `None` when the
    /// point lies outside the hull of cell centres (below the first or
    /// above the last row, or beyond the last column).
    pub fn interpolate(&self, values: &[f64], point: &Vec2) -> Option<f64> {
        let (r, z) = (point[0].abs(), point[1]);
        if !(r.is_finite() && z.is_finite()) {
            return None;
        }
        // Inside the first half cell the mirrored value equals column 0.
        let x = (r / self.dr - 0.5).max(0.0);
        let y = z / self.dz - 0.5;
        let (x_max, y_max) = ((self.nr - 1) as f64, (self.nz - 1) as f64);
        if x > x_max || y < 0.0 || y > y_max {
            return None;
        }
        let i0 = (x.floor() as usize).min(self.nr.saturating_sub(2));
        let j0 = (y.floor() as usize).min(self.nz.saturating_sub(2));
        let (i1, j1) = ((i0 + 1).min(self.nr - 1), (j0 + 1).min(self.nz - 1));
        let (tx, ty) = (x - i0 as f64, y - j0 as f64);
        let v = |i, j| values[self.index(i, j)];
        let bottom = v(i0, j0) * (1.0 - tx) + v(i1, j0) * tx;
        let top = v(i0, j1) * (1.0 - tx) + v(i1, j1) * tx;
        Some(bottom * (1.0 - ty) + top * ty)
    }
}
