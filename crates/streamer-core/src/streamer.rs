//! Per-channel streamer state.

use indexmap::IndexMap;

use crate::id::StreamerId;
use crate::vector::Vector;

/// Live streamers keyed by id, in ascending id order.
///
/// Insertion order equals allocation order, so iteration order is the
/// deterministic per-step processing and rasterization order. Removal
/// must use `retain` (or `shift_remove`) to keep that order stable.
pub type StreamerSet<const D: usize> = IndexMap<StreamerId, StreamerState<D>>;

/// Branching descriptor for a channel that is about to split.
///
/// Carried in the state record but not acted on by the update rules.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Branching {
    /// Opening angle between the two daughter channels, in radians.
    pub angle: f64,
}

/// State of a single streamer channel.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamerState<const D: usize> {
    /// Position of the channel head (m).
    pub position: Vector<D>,
    /// Head velocity (m/s). Its direction is the sampling direction.
    pub velocity: Vector<D>,
    /// Channel radius (m). Never negative, never shrinks while alive.
    pub radius: f64,
    /// Equivalent conductivity at the head. Never negative.
    pub conductivity: f64,
    /// Exponentially smoothed high-field length (m).
    ///
    /// `None` until the streamer has been updated once.
    pub smoothed_length: Option<f64>,
    /// Cleared when sampling fails or the feature drops below its floor.
    pub alive: bool,
    /// Number of completed updates.
    pub age: u64,
    /// Optional branching descriptor.
    pub branching: Option<Branching>,
}

impl<const D: usize> StreamerState<D> {
    /// A fresh, alive streamer that has not been updated yet.
    pub fn new(position: Vector<D>, velocity: Vector<D>, radius: f64, conductivity: f64) -> Self {
        Self {
            position,
            velocity,
            radius: radius.max(0.0),
            conductivity: conductivity.max(0.0),
            smoothed_length: None,
            alive: true,
            age: 0,
            branching: None,
        }
    }

    /// Head speed `|v|`.
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// True until the streamer has completed its first update.
    pub fn is_first_step(&self) -> bool {
        self.age == 0
    }

    /// Copy of this state marked dead; every other quantity is kept.
    pub fn killed(&self) -> Self {
        Self {
            alive: false,
            ..self.clone()
        }
    }

    /// True if every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.radius.is_finite()
            && self.conductivity.is_finite()
            && self.smoothed_length.is_none_or(f64::is_finite)
    }
}
