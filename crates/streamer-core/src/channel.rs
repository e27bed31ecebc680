//! Conductivity-channel update instructions passed to the field solver.
//!
//! The model never writes into solver memory. Instead it describes, per
//! streamer, how the channel moved during the step (a [`ChannelSegment`])
//! and optionally an explicit conductivity distribution along it (a
//! [`ChannelProfile`]). The solver turns these into its own
//! conductivity field.

use smallvec::SmallVec;

use crate::id::{StepIndex, StreamerId};
use crate::vector::Vector;

/// Compactly supported radial weight with unit disk integral.
///
/// `w(r) ∝ max(0, 1 − 3(r/R)² + 2(r/R)³)`: maximal on the axis, zero at
/// and beyond `R`, with zero slope at both ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialWeight {
    r_max: f64,
}

impl RadialWeight {
    /// Weight supported on `[0, r_max]`. `r_max` must be positive.
    pub fn new(r_max: f64) -> Self {
        Self { r_max }
    }

    /// Support radius.
    pub fn r_max(&self) -> f64 {
        self.r_max
    }

    /// Unnormalized shape at `x = r / r_max`.
    fn shape(x: f64) -> f64 {
        if x >= 1.0 {
            0.0
        } else {
            (1.0 - 3.0 * x * x + 2.0 * x * x * x).max(0.0)
        }
    }

    /// Normalized weight at radius `r`.
    ///
    /// `∫ 2πr w(r) dr` over `[0, r_max]` equals one: the shape integrates
    /// to `0.3 π r_max²`.
    pub fn weight(&self, r: f64) -> f64 {
        if self.r_max <= 0.0 {
            return 0.0;
        }
        Self::shape(r.abs() / self.r_max) / (0.3 * std::f64::consts::PI * self.r_max * self.r_max)
    }

    /// Weights at `n_points` evenly spaced radii in `[0, r_max]`,
    /// normalized so the discrete disk sum `Σ 2π r_i Δr w_i` is one.
    ///
    /// Returns an empty vector when `n_points < 2`.
    pub fn sampled(&self, n_points: usize) -> Vec<f64> {
        if n_points < 2 || self.r_max <= 0.0 {
            return Vec::new();
        }
        let dr = self.r_max / (n_points - 1) as f64;
        let last = (n_points - 1) as f64;
        let raw: Vec<f64> = (0..n_points)
            .map(|i| Self::shape(i as f64 / last))
            .collect();
        let total: f64 = raw
            .iter()
            .enumerate()
            .map(|(i, w)| 2.0 * std::f64::consts::PI * (i as f64 * dr) * dr * w)
            .sum();
        raw.into_iter().map(|w| w / total).collect()
    }
}

/// Explicit conductivity distribution along a channel.
///
/// `values[j]` is the line conductivity at axial coordinate
/// `origin + j·spacing` measured along `direction`. Off axis it is spread
/// with `radial`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelProfile<const D: usize> {
    /// Point from which the axial coordinate is measured.
    pub origin: Vector<D>,
    /// Unit channel direction.
    pub direction: Vector<D>,
    /// Axial sample spacing (m).
    pub spacing: f64,
    /// Axial conductivity samples. Never negative.
    pub values: Vec<f64>,
    /// Cross-section weight.
    pub radial: RadialWeight,
}

impl<const D: usize> ChannelProfile<D> {
    /// Axial value at coordinate `s`, linearly interpolated; zero outside.
    pub fn value_at(&self, s: f64) -> f64 {
        if self.values.is_empty() || self.spacing <= 0.0 || s < 0.0 {
            return 0.0;
        }
        let x = s / self.spacing;
        let last = self.values.len() - 1;
        if !x.is_finite() || x > last as f64 {
            return 0.0;
        }
        let i = x.floor() as usize;
        if i == last {
            return self.values[last];
        }
        let t = x - i as f64;
        self.values[i] * (1.0 - t) + self.values[i + 1] * t
    }

    /// Conductivity contributed at `point`.
    pub fn conductivity_at(&self, point: &Vector<D>) -> f64 {
        let rel = *point - self.origin;
        let s = rel.dot(&self.direction);
        let r_perp = (rel - self.direction * s).norm();
        (self.value_at(s) * self.radial.weight(r_perp)).max(0.0)
    }
}

/// How one streamer's channel changed during a step.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelSegment<const D: usize> {
    /// Streamer this segment belongs to.
    pub id: StreamerId,
    /// Head position at the start of the step.
    pub prev_position: Vector<D>,
    /// Head position at the end of the step.
    pub position: Vector<D>,
    /// Radius at the start of the step.
    pub prev_radius: f64,
    /// Radius at the end of the step.
    pub radius: f64,
    /// Conductivity at the start of the step.
    pub prev_conductivity: f64,
    /// Conductivity at the end of the step.
    pub conductivity: f64,
    /// The streamer's first update: the `prev_*` values are a seed, not a
    /// real channel, and must not be interpolated from.
    pub first_step: bool,
    /// Explicit distribution, when the rasterizer builds one.
    pub profile: Option<ChannelProfile<D>>,
}

impl<const D: usize> ChannelSegment<D> {
    /// Head-disk conductivity at `point`, or `None` outside the channel.
    ///
    /// On a first step only the current head disk counts. Otherwise the
    /// swept capsule between the two head positions is used, with radius
    /// and conductivity interpolated linearly along it.
    pub fn head_disk_at(&self, point: &Vector<D>) -> Option<f64> {
        if self.first_step {
            return (point.distance(&self.position) <= self.radius)
                .then_some(self.conductivity.max(0.0));
        }
        let axis = self.position - self.prev_position;
        let len2 = axis.dot(&axis);
        let t = if len2 > 0.0 {
            ((*point - self.prev_position).dot(&axis) / len2).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let closest = self.prev_position + axis * t;
        let radius = self.prev_radius + t * (self.radius - self.prev_radius);
        (point.distance(&closest) <= radius).then(|| {
            (self.prev_conductivity + t * (self.conductivity - self.prev_conductivity)).max(0.0)
        })
    }
}

/// All channel segments for one step, in ascending streamer id order.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelUpdate<const D: usize> {
    /// Step that produced this update.
    pub step: StepIndex,
    segments: SmallVec<[ChannelSegment<D>; 4]>,
}

impl<const D: usize> ChannelUpdate<D> {
    /// Empty update for `step`.
    pub fn new(step: StepIndex) -> Self {
        Self {
            step,
            segments: SmallVec::new(),
        }
    }

    /// Append a segment. Callers push in ascending id order.
    pub fn push(&mut self, segment: ChannelSegment<D>) {
        debug_assert!(
            self.segments.last().is_none_or(|last| last.id < segment.id),
            "segments must be pushed in ascending streamer id order"
        );
        self.segments.push(segment);
    }

    /// Segments in application order.
    pub fn segments(&self) -> &[ChannelSegment<D>] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True if no streamer contributed.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vec2;

    fn segment(first_step: bool) -> ChannelSegment<2> {
        ChannelSegment {
            id: StreamerId(0),
            prev_position: Vec2::new([0.0, 0.0]),
            position: Vec2::new([0.0, 1.0]),
            prev_radius: 0.1,
            radius: 0.3,
            prev_conductivity: 1.0,
            conductivity: 3.0,
            first_step,
            profile: None,
        }
    }

    #[test]
    fn radial_weight_is_zero_at_edge_and_max_on_axis() {
        let w = RadialWeight::new(2.0);
        assert_eq!(w.weight(2.0), 0.0);
        assert_eq!(w.weight(5.0), 0.0);
        assert!(w.weight(0.0) > w.weight(0.5));
        assert!(w.weight(0.5) > w.weight(1.5));
    }

    #[test]
    fn radial_weight_integrates_to_one() {
        let w = RadialWeight::new(1e-3);
        let n = 20_000;
        let dr = 1e-3 / n as f64;
        let total: f64 = (0..n)
            .map(|i| {
                let r = (i as f64 + 0.5) * dr;
                2.0 * std::f64::consts::PI * r * w.weight(r) * dr
            })
            .sum();
        assert!((total - 1.0).abs() < 1e-6, "integral = {total}");
    }

    #[test]
    fn sampled_weights_have_unit_discrete_integral() {
        let w = RadialWeight::new(0.5e-3);
        let n = 64;
        let samples = w.sampled(n);
        assert_eq!(samples.len(), n);
        let dr = 0.5e-3 / (n - 1) as f64;
        let total: f64 = samples
            .iter()
            .enumerate()
            .map(|(i, w)| 2.0 * std::f64::consts::PI * (i as f64 * dr) * dr * w)
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(*samples.last().unwrap(), 0.0);
        assert!(w.sampled(1).is_empty());
    }

    #[test]
    fn head_disk_first_step_uses_current_disk_only() {
        let seg = segment(true);
        assert_eq!(seg.head_disk_at(&Vec2::new([0.0, 0.9])), Some(3.0));
        assert_eq!(seg.head_disk_at(&Vec2::new([0.0, 0.2])), None);
    }

    #[test]
    fn head_disk_interpolates_along_swept_capsule() {
        let seg = segment(false);
        let mid = seg.head_disk_at(&Vec2::new([0.0, 0.5])).unwrap();
        assert!((mid - 2.0).abs() < 1e-12);
        // Radius at the midpoint is 0.2.
        assert!(seg.head_disk_at(&Vec2::new([0.19, 0.5])).is_some());
        assert!(seg.head_disk_at(&Vec2::new([0.21, 0.5])).is_none());
    }

    #[test]
    fn profile_interpolates_and_spreads_radially() {
        let profile = ChannelProfile {
            origin: Vec2::new([0.0, 0.0]),
            direction: Vec2::unit(1),
            spacing: 1.0,
            values: vec![0.0, 2.0, 4.0],
            radial: RadialWeight::new(0.5),
        };
        assert_eq!(profile.value_at(1.5), 3.0);
        assert_eq!(profile.value_at(2.0), 4.0);
        assert_eq!(profile.value_at(-0.1), 0.0);
        assert_eq!(profile.value_at(2.5), 0.0);
        let on_axis = profile.conductivity_at(&Vec2::new([0.0, 1.5]));
        assert!((on_axis - 3.0 * RadialWeight::new(0.5).weight(0.0)).abs() < 1e-12);
        assert_eq!(profile.conductivity_at(&Vec2::new([0.6, 1.5])), 0.0);
    }

    #[test]
    fn profile_is_zero_at_extreme_coordinates() {
        let profile = ChannelProfile {
            origin: Vec2::ZERO,
            direction: Vec2::unit(1),
            spacing: 1.0,
            values: vec![1.0, 2.0],
            radial: RadialWeight::new(0.5),
        };
        assert_eq!(profile.value_at(1e300), 0.0);
        assert_eq!(profile.value_at(f64::INFINITY), 0.0);
        assert_eq!(profile.value_at(f64::NAN), 0.0);
        assert_eq!(profile.value_at(1.0), 2.0);
        assert_eq!(profile.conductivity_at(&Vec2::new([0.0, f64::MAX])), 0.0);
    }

    #[test]
    fn update_keeps_push_order() {
        let mut update = ChannelUpdate::new(StepIndex(1));
        assert!(update.is_empty());
        let mut a = segment(false);
        a.id = StreamerId(1);
        let mut b = segment(false);
        b.id = StreamerId(4);
        update.push(a);
        update.push(b);
        let ids: Vec<u32> = update.segments().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(update.len(), 2);
    }
}
