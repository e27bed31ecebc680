//! Fixed-dimension geometry vector.
//!
//! [`Vector<D>`] is used for positions and velocities. The model runs in
//! either two dimensions (axisymmetric `(r, z)`) or three (Cartesian
//! `(x, y, z)`), selected by the const parameter `D`.

use std::ops::{Add, AddAssign, Index, Mul, Sub};

/// A point or displacement in `D`-dimensional physical space (metres).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vector<const D: usize>(pub [f64; D]);

/// Two-dimensional vector, `(r, z)` in the axisymmetric model.
pub type Vec2 = Vector<2>;

/// Three-dimensional vector, `(x, y, z)`.
pub type Vec3 = Vector<3>;

impl<const D: usize> Vector<D> {
    /// The zero vector.
    pub const ZERO: Self = Self([0.0; D]);

    /// Construct from components.
    pub const fn new(components: [f64; D]) -> Self {
        Self(components)
    }

    /// Unit vector along axis `axis`.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= D`.
    pub fn unit(axis: usize) -> Self {
        let mut c = [0.0; D];
        c[axis] = 1.0;
        Self(c)
    }

    /// Borrow the components.
    pub fn components(&self) -> &[f64; D] {
        &self.0
    }

    /// Dot product.
    pub fn dot(&self, other: &Self) -> f64 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    /// Euclidean length.
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or `None` for a zero or
    /// non-finite vector.
    pub fn normalized(&self) -> Option<Self> {
        let n = self.norm();
        if n > 0.0 && n.is_finite() {
            Some(*self * (1.0 / n))
        } else {
            None
        }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).norm()
    }

    /// Linear interpolation: `self` at `t = 0`, `other` at `t = 1`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        *self + (*other - *self) * t
    }

    /// True if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }
}

impl<const D: usize> Default for Vector<D> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<const D: usize> From<[f64; D]> for Vector<D> {
    fn from(c: [f64; D]) -> Self {
        Self(c)
    }
}

impl<const D: usize> Index<usize> for Vector<D> {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl<const D: usize> Add for Vector<D> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0.iter()) {
            *o += r;
        }
        Self(out)
    }
}

impl<const D: usize> AddAssign for Vector<D> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<const D: usize> Sub for Vector<D> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0.iter()) {
            *o -= r;
        }
        Self(out)
    }
}

impl<const D: usize> Mul<f64> for Vector<D> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        let mut out = self.0;
        for o in out.iter_mut() {
            *o *= rhs;
        }
        Self(out)
    }
}
