//! Axial conductivity profile along a straight channel.
//!
//! The profile stores line conductivity at evenly spaced axial
//! coordinates `s_j = j·spacing`, measured from `origin` along
//! `direction`. Every step the region from the previous tail cut to the
//! new head is rewritten:
//!
//! ```text
//! d_behind = travel + R
//! i        = first j with s_j > s_head − d_behind
//! slope    = (sigma_head − values[i]) / (d_behind − R)     (0 if travel == 0)
//! xs       = s − s_head + R
//! f(s)     = clamp(sigma_head + xs·slope, 0, sigma_head)    xs < 0
//!          = sigma_head · (1 − (xs/R)³)                     0 ≤ xs < R
//!          = 0                                              xs ≥ R
//! ```
//!
//! The ramp behind the head starts from the old value at the cut, and
//! nothing behind the cut is touched.

use streamer_core::{ChannelProfile, RadialWeight, Vector};

/// Upper bound on stored samples; heads further out are not extended to.
const MAX_SAMPLES: usize = 1 << 20;

/// Conductivity samples along one streamer's axis.
#[derive(Clone, Debug, PartialEq)]
pub struct AxialProfile<const D: usize> {
    origin: Vector<D>,
    direction: Vector<D>,
    spacing: f64,
    values: Vec<f64>,
}

impl<const D: usize> AxialProfile<D> {
    /// Empty profile starting at `origin`.
    ///
    /// `direction` should be a unit vector and `spacing` positive.
    pub fn new(origin: Vector<D>, direction: Vector<D>, spacing: f64) -> Self {
        Self {
            origin,
            direction,
            spacing,
            values: Vec::new(),
        }
    }

    /// Start of the axial coordinate.
    pub fn origin(&self) -> Vector<D> {
        self.origin
    }

    /// Unit axis direction.
    pub fn direction(&self) -> Vector<D> {
        self.direction
    }

    /// Sample spacing (m).
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Current samples.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Axial coordinate of `point` (projection onto the axis).
    pub fn coordinate_of(&self, point: &Vector<D>) -> f64 {
        (*point - self.origin).dot(&self.direction)
    }

    /// Rewrite the profile for a head now at `head` that moved `travel`
    /// metres this step, with radius `radius` and conductivity `sigma_head`.
    pub fn advance_head(&mut self, head: &Vector<D>, travel: f64, radius: f64, sigma_head: f64) {
        let s_head = self.coordinate_of(head);
        let radius = radius.max(0.0);
        let sigma_head = sigma_head.max(0.0);
        let travel = travel.max(0.0);
        if !(s_head.is_finite() && radius.is_finite() && travel.is_finite()) {
            return;
        }

        let reach = s_head + radius;
        if reach >= 0.0 {
            // Float-to-int casts saturate, so the sum is done in f64.
            let needed = ((reach / self.spacing).floor() + 2.0).min(MAX_SAMPLES as f64) as usize;
            if needed > self.values.len() {
                self.values.resize(needed, 0.0);
            }
        }

        let d_behind = travel + radius;
        let cut = s_head - d_behind;
        // First sample strictly past the cut.
        let first = if cut < 0.0 {
            0
        } else {
            ((cut / self.spacing).floor() + 1.0) as usize
        };
        if first >= self.values.len() {
            return;
        }

        let anchor = self.values[first];
        let slope = if d_behind == radius {
            0.0
        } else {
            (sigma_head - anchor) / (d_behind - radius)
        };

        for (j, value) in self.values.iter_mut().enumerate().skip(first) {
            let xs = j as f64 * self.spacing - s_head + radius;
            *value = if xs < 0.0 {
                (sigma_head + xs * slope).clamp(0.0, sigma_head)
            } else if xs < radius {
                let u = xs / radius;
                sigma_head * (1.0 - u * u * u)
            } else {
                0.0
            };
        }
    }

    /// Snapshot for the solver, spread radially over `radius`.
    pub fn to_channel(&self, radius: f64) -> ChannelProfile<D> {
        ChannelProfile {
            origin: self.origin,
            direction: self.direction,
            spacing: self.spacing,
            values: self.values.clone(),
            radial: RadialWeight::new(radius),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use streamer_core::Vec3;

    fn profile() -> AxialProfile<3> {
        AxialProfile::new(Vec3::ZERO, Vec3::unit(2), 1e-4)
    }

    #[test]
    fn first_update_ramps_toward_head() {
        let mut p = profile();
        // Head moved 1 mm from the origin with R = 0.2 mm.
        p.advance_head(&Vec3::new([0.0, 0.0, 1e-3]), 1e-3, 2e-4, 1.0);
        let v = p.values();
        // Linear ramp over the travel distance, reaching sigma_head at
        // s_head − R = 0.8 mm.
        assert!((v[0] - 0.2).abs() < 1e-9, "v[0] = {}", v[0]);
        assert!((v[4] - 0.6).abs() < 1e-9, "v[4] = {}", v[4]);
        assert!((v[8] - 1.0).abs() < 1e-9);
        // Cubic falloff ahead, zero from the head on.
        assert!((v[9] - 0.875).abs() < 1e-9);
        assert!(v[10] < 1e-9);
        assert!(v.iter().all(|&x| (0.0..=1.0).contains(&x)));
    }

    #[test]
    fn trailing_channel_is_kept_behind_cut() {
        let mut p = profile();
        p.advance_head(&Vec3::new([0.0, 0.0, 1e-3]), 1e-3, 2e-4, 1.0);
        let before = p.values()[..8].to_vec();
        // Next step moves another 0.3 mm; cut at 1.3 − 0.5 = 0.8 mm.
        p.advance_head(&Vec3::new([0.0, 0.0, 1.3e-3]), 3e-4, 2e-4, 2.0);
        assert_eq!(&p.values()[..8], &before[..]);
        // Past the cut the ramp runs from the old value up to the new head.
        let v = p.values();
        assert!(v[9] >= 1.0 && v[9] <= 2.0, "v[9] = {}", v[9]);
        assert!((v[11] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_travel_uses_flat_tail() {
        let mut p = profile();
        p.advance_head(&Vec3::new([0.0, 0.0, 5e-4]), 0.0, 1e-4, 0.5);
        assert!(p.values().iter().all(|&x| x <= 0.5 && x >= 0.0));
    }

    #[test]
    fn far_or_non_finite_head_is_bounded() {
        let mut p = profile();
        p.advance_head(&Vec3::new([0.0, 0.0, 1e300]), 1e300, 2e-4, 1.0);
        assert_eq!(p.values().len(), MAX_SAMPLES);
        assert!(p.values().iter().all(|&x| (0.0..=1.0).contains(&x)));

        let mut q = profile();
        q.advance_head(&Vec3::new([0.0, 0.0, f64::INFINITY]), 1e-3, 2e-4, 1.0);
        q.advance_head(&Vec3::new([0.0, 0.0, f64::NAN]), 1e-3, 2e-4, 1.0);
        assert!(q.values().is_empty());
    }

    #[test]
    fn to_channel_carries_samples() {
        let mut p = profile();
        p.advance_head(&Vec3::new([0.0, 0.0, 1e-3]), 1e-3, 2e-4, 1.0);
        let ch = p.to_channel(2e-4);
        assert_eq!(ch.values, p.values());
        assert_eq!(ch.radial.r_max(), 2e-4);
        assert!((ch.value_at(8e-4) - 1.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn profile_stays_within_zero_and_max_head(
            steps in proptest::collection::vec((1e-5f64..5e-4, 1e-5f64..3e-4, 0.0f64..10.0), 1..12),
        ) {
            let mut p = profile();
            let mut z = 0.0;
            let mut max_sigma = 0.0f64;
            for (travel, radius, sigma) in steps {
                z += travel;
                max_sigma = max_sigma.max(sigma);
                p.advance_head(&Vec3::new([0.0, 0.0, z]), travel, radius, sigma);
                for &x in p.values() {
                    prop_assert!(x >= 0.0);
                    prop_assert!(x <= max_sigma + 1e-12);
                }
            }
        }
    }
}
