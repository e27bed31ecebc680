//! Field-profile sampling ahead of a streamer tip.

use streamer_core::{FieldQuantity, FieldSolver, LineQuery, LineSample, StreamerState, Vector};

/// Queries `|E|` along a ray at two samples per finest grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldProfileSampler<const D: usize> {
    max_distance: f64,
    fallback_direction: Vector<D>,
}

impl<const D: usize> FieldProfileSampler<D> {
    /// Sampler reaching `max_distance` ahead of the start point.
    ///
    /// `fallback_direction` is used whenever a streamer has zero
    /// velocity. It is normalized here; a zero vector is kept as is and
    /// produces a degenerate ray that samples only the start point.
    pub fn new(max_distance: f64, fallback_direction: Vector<D>) -> Self {
        Self {
            max_distance,
            fallback_direction: fallback_direction
                .normalized()
                .unwrap_or(fallback_direction),
        }
    }

    /// Distance covered by every query.
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Direction used when a streamer is not moving.
    pub fn fallback_direction(&self) -> Vector<D> {
        self.fallback_direction
    }

    /// `max(2, round(2·max_distance / h))`.
    pub fn sample_count(&self, spacing: f64) -> usize {
        if !spacing.is_finite() || spacing <= 0.0 {
            return 2;
        }
        let n = (2.0 * self.max_distance / spacing).round();
        if n.is_finite() && n > 2.0 {
            n as usize
        } else {
            2
        }
    }

    /// Unit propagation direction of `state`, or the fallback.
    pub fn direction_of(&self, state: &StreamerState<D>) -> Vector<D> {
        state
            .velocity
            .normalized()
            .unwrap_or(self.fallback_direction)
    }

    /// Ray starting half a radius ahead of the head along its direction.
    pub fn ray_for(&self, state: &StreamerState<D>, spacing: f64) -> LineQuery<D> {
        let direction = self.direction_of(state);
        LineQuery {
            start: state.position + direction * (0.5 * state.radius),
            direction,
            max_distance: self.max_distance,
            sample_count: self.sample_count(spacing),
        }
    }

    /// Ray from an arbitrary point along the fallback direction.
    pub fn ray_from(&self, start: Vector<D>, spacing: f64) -> LineQuery<D> {
        LineQuery {
            start,
            direction: self.fallback_direction,
            max_distance: self.max_distance,
            sample_count: self.sample_count(spacing),
        }
    }

    /// Sample `|E|` along `query`.
    ///
    /// A reported success whose data is empty, ragged, or non-finite is
    /// downgraded to a failure.
    pub fn sample<S>(&self, solver: &S, query: &LineQuery<D>) -> LineSample
    where
        S: FieldSolver<D> + ?Sized,
    {
        let sample = solver.sample_line(FieldQuantity::FieldNorm, query);
        if sample.is_usable() {
            sample
        } else {
            LineSample::failed()
        }
    }

    /// Sample ahead of `state`'s tip.
    pub fn sample_ahead<S>(&self, solver: &S, state: &StreamerState<D>) -> LineSample
    where
        S: FieldSolver<D> + ?Sized,
    {
        let query = self.ray_for(state, solver.finest_grid_spacing());
        self.sample(solver, &query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamer_core::Vec2;
    use streamer_test_utils::ScriptedSolver;

    fn sampler() -> FieldProfileSampler<2> {
        FieldProfileSampler::new(5e-3, Vec2::new([0.0, 2.0]))
    }

    #[test]
    fn two_samples_per_cell_with_floor_of_two() {
        let s = sampler();
        assert_eq!(s.sample_count(1e-4), 100);
        assert_eq!(s.sample_count(1.0), 2);
        assert_eq!(s.sample_count(0.0), 2);
        assert_eq!(s.fallback_direction(), Vec2::unit(1));
    }

    #[test]
    fn ray_starts_half_radius_ahead() {
        let s = sampler();
        let state = StreamerState::new(
            Vec2::new([0.0, 1e-2]),
            Vec2::new([0.0, -3e5]),
            2e-4,
            0.0,
        );
        let ray = s.ray_for(&state, 1e-4);
        assert_eq!(ray.direction, Vec2::new([0.0, -1.0]));
        assert!((ray.start[1] - (1e-2 - 1e-4)).abs() < 1e-15);
        assert_eq!(ray.max_distance, 5e-3);
    }

    #[test]
    fn zero_velocity_uses_fallback_direction() {
        let s = sampler();
        let state = StreamerState::new(Vec2::ZERO, Vec2::ZERO, 0.0, 0.0);
        assert_eq!(s.direction_of(&state), Vec2::unit(1));
    }

    #[test]
    fn inconsistent_success_is_a_failure() {
        let solver = ScriptedSolver::<2>::new(1e-4, |_q, _| LineSample::new(vec![0.0, 1.0], vec![1.0]));
        let query = sampler().ray_from(Vec2::ZERO, 1e-4);
        assert!(!sampler().sample(&solver, &query).success);
    }

    #[test]
    fn sample_ahead_forwards_solver_data() {
        let solver = ScriptedSolver::<2>::new(1e-4, |q, _| {
            let coords = q.coordinates();
            let values = coords.iter().map(|s| 1e7 - 2e9 * s).collect();
            LineSample::new(coords, values)
        });
        let state = StreamerState::new(Vec2::ZERO, Vec2::unit(1), 0.0, 0.0);
        let sample = sampler().sample_ahead(&solver, &state);
        assert!(sample.success);
        assert_eq!(sample.values.len(), 100);
        assert_eq!(sample.values[0], 1e7);
    }
}
