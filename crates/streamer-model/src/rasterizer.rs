//! Conductivity-channel rasterization: previous and current streamer
//! states in, one [`ChannelUpdate`] for the field solver out.

use indexmap::IndexMap;

use streamer_core::{ChannelSegment, ChannelUpdate, StepIndex, StreamerId, StreamerSet, Vector};

use crate::profile::AxialProfile;

/// How a channel is represented to the solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChannelShape {
    /// Head-disk segment only; the solver builds the channel itself.
    HeadDisk,
    /// Segment plus an explicit axial profile spread with a radial weight.
    RadialProfile {
        /// Axial sample spacing (m).
        spacing: f64,
    },
}

/// Builds per-step channel updates and keeps per-streamer axial profiles.
#[derive(Clone, Debug)]
pub struct ConductivityRasterizer<const D: usize> {
    shape: ChannelShape,
    profiles: IndexMap<StreamerId, AxialProfile<D>>,
}

impl<const D: usize> ConductivityRasterizer<D> {
    /// Create a rasterizer for `shape`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a profile spacing is not positive and finite.
    pub fn new(shape: ChannelShape) -> Result<Self, String> {
        if let ChannelShape::RadialProfile { spacing } = shape {
            if !spacing.is_finite() || spacing <= 0.0 {
                return Err(format!("profile spacing must be finite and > 0, got {spacing}"));
            }
        }
        Ok(Self {
            shape,
            profiles: IndexMap::new(),
        })
    }

    /// Configured shape.
    pub fn shape(&self) -> ChannelShape {
        self.shape
    }

    /// Axial profile currently kept for `id`, if any.
    pub fn profile(&self, id: StreamerId) -> Option<&AxialProfile<D>> {
        self.profiles.get(&id)
    }

    /// Build the update for `step`.
    ///
    /// One segment per alive streamer in `current`, in its iteration
    /// (ascending id) order. `previous` is the frozen snapshot from the
    /// start of the step. Profiles of streamers that are no longer alive
    /// are dropped.
    pub fn rasterize(
        &mut self,
        step: StepIndex,
        previous: &StreamerSet<D>,
        current: &StreamerSet<D>,
    ) -> ChannelUpdate<D> {
        let mut update = ChannelUpdate::new(step);

        for (&id, cur) in current.iter().filter(|(_, s)| s.alive) {
            let prev = previous.get(&id).unwrap_or(cur);
            let first_step = prev.is_first_step();

            let profile = match self.shape {
                ChannelShape::HeadDisk => None,
                ChannelShape::RadialProfile { spacing } => {
                    let travel = cur.position.distance(&prev.position);
                    if first_step || !self.profiles.contains_key(&id) {
                        let axis = (cur.position - prev.position)
                            .normalized()
                            .or_else(|| cur.velocity.normalized())
                            .unwrap_or_else(|| Vector::unit(D - 1));
                        self.profiles
                            .insert(id, AxialProfile::new(prev.position, axis, spacing));
                    }
                    self.profiles.get_mut(&id).map(|p| {
                        p.advance_head(&cur.position, travel, cur.radius, cur.conductivity);
                        p.to_channel(cur.radius)
                    })
                }
            };

            update.push(ChannelSegment {
                id,
                prev_position: prev.position,
                position: cur.position,
                prev_radius: prev.radius,
                radius: cur.radius,
                prev_conductivity: prev.conductivity,
                conductivity: cur.conductivity,
                first_step,
                profile,
            });
        }

        self.profiles
            .retain(|id, _| current.get(id).is_some_and(|s| s.alive));
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamer_core::{StreamerState, Vec2, Vec3};

    fn pair<const D: usize>(
        prev: StreamerState<D>,
        cur: StreamerState<D>,
        id: u32,
    ) -> (StreamerSet<D>, StreamerSet<D>) {
        let mut p = StreamerSet::new();
        let mut c = StreamerSet::new();
        p.insert(StreamerId(id), prev);
        c.insert(StreamerId(id), cur);
        (p, c)
    }

    fn advanced<const D: usize>(s: &StreamerState<D>, to: Vector<D>, r: f64, sigma: f64) -> StreamerState<D> {
        StreamerState {
            position: to,
            radius: r,
            conductivity: sigma,
            age: s.age + 1,
            smoothed_length: Some(1e-3),
            ..s.clone()
        }
    }

    #[test]
    fn head_disk_segment_carries_both_states() {
        let prev = StreamerState::new(Vec2::new([0.0, 1e-2]), Vec2::unit(1), 1e-4, 0.0);
        let cur = advanced(&prev, Vec2::new([0.0, 1.1e-2]), 1.5e-4, 2.0);
        let (p, c) = pair(prev, cur, 3);
        let mut r = ConductivityRasterizer::new(ChannelShape::HeadDisk).unwrap();
        let update = r.rasterize(StepIndex(1), &p, &c);
        assert_eq!(update.len(), 1);
        let seg = &update.segments()[0];
        assert_eq!(seg.id, StreamerId(3));
        assert!(seg.first_step);
        assert_eq!(seg.prev_radius, 1e-4);
        assert_eq!(seg.radius, 1.5e-4);
        assert_eq!(seg.conductivity, 2.0);
        assert!(seg.profile.is_none());
    }

    #[test]
    fn later_steps_are_not_first_steps() {
        let seed = StreamerState::new(Vec2::ZERO, Vec2::unit(1), 1e-4, 0.0);
        let prev = advanced(&seed, Vec2::new([0.0, 1e-3]), 1e-4, 1.0);
        let cur = advanced(&prev, Vec2::new([0.0, 2e-3]), 1e-4, 1.0);
        let (p, c) = pair(prev, cur, 0);
        let mut r = ConductivityRasterizer::new(ChannelShape::HeadDisk).unwrap();
        assert!(!r.rasterize(StepIndex(2), &p, &c).segments()[0].first_step);
    }

    #[test]
    fn dead_streamers_are_skipped_and_order_is_ascending() {
        let mut p = StreamerSet::new();
        let mut c = StreamerSet::new();
        for i in 0..4u32 {
            let s = StreamerState::new(Vec2::new([i as f64 * 1e-3, 0.0]), Vec2::unit(1), 1e-4, 0.0);
            let mut next = advanced(&s, s.position + Vec2::new([0.0, 1e-4]), 1e-4, 1.0);
            next.alive = i != 2;
            p.insert(StreamerId(i), s);
            c.insert(StreamerId(i), next);
        }
        let mut r = ConductivityRasterizer::new(ChannelShape::HeadDisk).unwrap();
        let update = r.rasterize(StepIndex(1), &p, &c);
        let ids: Vec<u32> = update.segments().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![0, 1, 3]);
    }

    #[test]
    fn radial_profile_starts_at_previous_head() {
        let prev = StreamerState::new(Vec3::new([0.0, 0.0, 1e-3]), Vec3::unit(2), 1e-4, 0.0);
        let cur = advanced(&prev, Vec3::new([0.0, 0.0, 2e-3]), 2e-4, 1.0);
        let (p, c) = pair(prev, cur, 0);
        let mut r = ConductivityRasterizer::new(ChannelShape::RadialProfile { spacing: 1e-4 }).unwrap();
        let update = r.rasterize(StepIndex(1), &p, &c);
        let profile = update.segments()[0].profile.as_ref().unwrap();
        assert_eq!(profile.origin, Vec3::new([0.0, 0.0, 1e-3]));
        assert_eq!(profile.direction, Vec3::unit(2));
        assert!(profile.values.iter().all(|&v| v >= 0.0));
        assert!(r.profile(StreamerId(0)).is_some());
    }

    #[test]
    fn profiles_are_dropped_when_streamer_dies() {
        let prev = StreamerState::new(Vec3::ZERO, Vec3::unit(2), 1e-4, 0.0);
        let cur = advanced(&prev, Vec3::new([0.0, 0.0, 1e-3]), 1e-4, 1.0);
        let (p, c) = pair(prev, cur.clone(), 0);
        let mut r = ConductivityRasterizer::new(ChannelShape::RadialProfile { spacing: 1e-4 }).unwrap();
        r.rasterize(StepIndex(1), &p, &c);
        assert!(r.profile(StreamerId(0)).is_some());

        let (p, c) = pair(cur.clone(), cur.killed(), 0);
        let update = r.rasterize(StepIndex(2), &p, &c);
        assert!(update.is_empty());
        assert!(r.profile(StreamerId(0)).is_none());
    }

    #[test]
    fn rejects_bad_spacing() {
        assert!(ConductivityRasterizer::<3>::new(ChannelShape::RadialProfile { spacing: 0.0 }).is_err());
    }
}
