//! Streamer growth rules: from the smoothed high-field length to new
//! radius, velocity, conductivity and head position.
//!
//! Two strategies implement [`PropagationModel`]:
//!
//! | Strategy | Conductivity | Speed and radius from |
//! |----------|--------------|-----------------------|
//! | [`FeatureDriven`] | `max(sigma, sigma(L_E))` | `L_E` |
//! | [`ConductivityDriven`] | relaxes toward `sigma(L_E)` at a capped rate | updated `sigma` |
//!
//! Both bound radial growth by the distance the head can travel in one
//! step, so the channel never widens faster than it advances.

use streamer_core::{StreamerState, Vector};

use crate::correlation::{ConductivityCorrelations, LengthCorrelations};

/// Initial radius and conductivity for a new streamer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Seed {
    /// Initial channel radius (m).
    pub radius: f64,
    /// Initial conductivity.
    pub conductivity: f64,
}

/// A rule that advances one streamer by one timestep.
///
/// Implementations are pure: the new state depends only on the previous
/// state, the smoothed length and the step parameters.
///
/// # Example
///
/// ```
/// use streamer_core::{StreamerState, Vec2};
/// use streamer_model::{FeatureDriven, PropagationModel};
///
/// let model = FeatureDriven::default();
/// let seed = <FeatureDriven as PropagationModel<2>>::seed(&model, 1e-3);
/// let start = StreamerState::new(Vec2::ZERO, Vec2::ZERO, seed.radius, seed.conductivity);
/// let next = model.advance(&start, 1e-3, 1e-10, Vec2::unit(1));
/// assert!(next.radius >= start.radius);
/// assert_eq!(next.age, 1);
/// ```
pub trait PropagationModel<const D: usize> {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Radius and conductivity of a streamer created at a location with
    /// high-field length `length`.
    fn seed(&self, length: f64) -> Seed;

    /// New state after `dt` seconds with smoothed length `length`.
    ///
    /// `direction` is the unit propagation direction. The returned state
    /// is alive, has `smoothed_length == Some(length)` and an age one
    /// greater than `prev`.
    fn advance(
        &self,
        prev: &StreamerState<D>,
        length: f64,
        dt: f64,
        direction: Vector<D>,
    ) -> StreamerState<D>;
}

/// Radius increment `clamp(target − radius, 0, speed·dt)`.
fn bounded_growth(radius: f64, target: f64, speed: f64, dt: f64) -> f64 {
    (target - radius).max(0.0).min(speed * dt)
}

fn next_state<const D: usize>(
    prev: &StreamerState<D>,
    position: Vector<D>,
    velocity: Vector<D>,
    radius: f64,
    conductivity: f64,
    length: f64,
) -> StreamerState<D> {
    StreamerState {
        position,
        velocity,
        radius,
        conductivity,
        smoothed_length: Some(length),
        alive: true,
        age: prev.age + 1,
        branching: prev.branching,
    }
}

// ── FeatureDriven ──────────────────────────────────────────────

/// Growth driven directly by the high-field length.
///
/// ```text
/// sigma' = max(sigma, sigma(L_E))
/// v'     = |v|(L_E) · direction
/// dR     = clamp(scale·R(L_E) − R, 0, |v'|·dt)
/// x'     = x + v' · (dt − 0.99·dR / |v'|)
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureDriven {
    correlations: LengthCorrelations,
    radius_scale: f64,
}

impl FeatureDriven {
    /// Fraction of the step treated as spent on radial growth.
    pub const GROWTH_TIME_FACTOR: f64 = 0.99;

    /// Create with the given fits and radius scale factor.
    pub fn new(correlations: LengthCorrelations, radius_scale: f64) -> Result<Self, String> {
        if !radius_scale.is_finite() || radius_scale <= 0.0 {
            return Err(format!("radius_scale must be finite and > 0, got {radius_scale}"));
        }
        let fits = [
            correlations.conductivity,
            correlations.speed,
            correlations.radius,
        ];
        if !fits.iter().all(|c| c.is_finite()) {
            return Err("correlation coefficients must be finite".to_string());
        }
        Ok(Self {
            correlations,
            radius_scale,
        })
    }

    /// Target radius `scale · R(L_E)`.
    pub fn target_radius(&self, length: f64) -> f64 {
        self.radius_scale * self.correlations.radius.eval(length)
    }
}

impl Default for FeatureDriven {
    fn default() -> Self {
        Self {
            correlations: LengthCorrelations::default(),
            radius_scale: 1.0,
        }
    }
}

impl<const D: usize> PropagationModel<D> for FeatureDriven {
    fn name(&self) -> &str {
        "FeatureDriven"
    }

    fn seed(&self, length: f64) -> Seed {
        Seed {
            radius: 0.5 * self.target_radius(length),
            conductivity: 0.0,
        }
    }

    fn advance(
        &self,
        prev: &StreamerState<D>,
        length: f64,
        dt: f64,
        direction: Vector<D>,
    ) -> StreamerState<D> {
        let c = &self.correlations;
        let conductivity = prev.conductivity.max(c.conductivity.eval(length));
        let speed = c.speed.eval(length);
        let velocity = direction * speed;

        let dr = bounded_growth(prev.radius, self.target_radius(length), speed, dt);
        let position = if speed > 0.0 {
            prev.position + velocity * (dt - Self::GROWTH_TIME_FACTOR * dr / speed)
        } else {
            prev.position
        };

        next_state(prev, position, velocity, prev.radius + dr, conductivity, length)
    }
}

// ── ConductivityDriven ─────────────────────────────────────────

/// Growth driven by a head conductivity that relaxes toward a
/// length-implied target.
///
/// ```text
/// sigma' = sigma + clamp(sigma(L_E) − sigma, 0, rate·dt)
/// v'     = |v|(sigma') · direction
/// R'     = R + clamp(scale·R(sigma') − R, 0, |v'|·dt)
/// x'     = x + (v + v')·dt / 2
/// ```
///
/// Constructed via the builder pattern: [`ConductivityDriven::builder`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConductivityDriven {
    correlations: ConductivityCorrelations,
    radius_scale: f64,
    rate: f64,
    initial_conductivity: Option<f64>,
}

/// Builder for [`ConductivityDriven`].
#[derive(Clone, Debug)]
pub struct ConductivityDrivenBuilder {
    correlations: ConductivityCorrelations,
    radius_scale: f64,
    rate: f64,
    initial_conductivity: Option<f64>,
}

impl ConductivityDriven {
    /// Create a new builder.
    pub fn builder() -> ConductivityDrivenBuilder {
        ConductivityDrivenBuilder {
            correlations: ConductivityCorrelations::default(),
            radius_scale: 1.0,
            rate: 1e3,
            initial_conductivity: None,
        }
    }

    /// Maximum conductivity increase per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl ConductivityDrivenBuilder {
    /// Set the fits (default: [`ConductivityCorrelations::default`]).
    pub fn correlations(mut self, correlations: ConductivityCorrelations) -> Self {
        self.correlations = correlations;
        self
    }

    /// Set the radius scale factor (default: 1).
    pub fn radius_scale(mut self, scale: f64) -> Self {
        self.radius_scale = scale;
        self
    }

    /// Set the conductivity growth cap per second (default: 1e3).
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Set the seed conductivity (default: the target at the seed length).
    pub fn initial_conductivity(mut self, sigma: f64) -> Self {
        self.initial_conductivity = Some(sigma);
        self
    }

    /// Build the model, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `radius_scale` or `rate` is not positive and
    /// finite, the seed conductivity is negative, or a coefficient is
    /// non-finite.
    pub fn build(self) -> Result<ConductivityDriven, String> {
        if !self.radius_scale.is_finite() || self.radius_scale <= 0.0 {
            return Err(format!(
                "radius_scale must be finite and > 0, got {}",
                self.radius_scale
            ));
        }
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(format!("rate must be finite and > 0, got {}", self.rate));
        }
        if let Some(sigma) = self.initial_conductivity {
            if !sigma.is_finite() || sigma < 0.0 {
                return Err(format!(
                    "initial_conductivity must be finite and >= 0, got {sigma}"
                ));
            }
        }
        let c = &self.correlations;
        if ![c.target, c.speed, c.radius].iter().all(|f| f.is_finite()) {
            return Err("correlation coefficients must be finite".to_string());
        }
        Ok(ConductivityDriven {
            correlations: self.correlations,
            radius_scale: self.radius_scale,
            rate: self.rate,
            initial_conductivity: self.initial_conductivity,
        })
    }
}

impl<const D: usize> PropagationModel<D> for ConductivityDriven {
    fn name(&self) -> &str {
        "ConductivityDriven"
    }

    fn seed(&self, length: f64) -> Seed {
        let conductivity = self
            .initial_conductivity
            .unwrap_or_else(|| self.correlations.target.eval(length));
        Seed {
            radius: self.radius_scale * self.correlations.radius.eval(conductivity),
            conductivity,
        }
    }

    fn advance(
        &self,
        prev: &StreamerState<D>,
        length: f64,
        dt: f64,
        direction: Vector<D>,
    ) -> StreamerState<D> {
        let c = &self.correlations;
        let target = c.target.eval(length);
        let conductivity =
            prev.conductivity + (target - prev.conductivity).max(0.0).min(self.rate * dt);

        let speed = c.speed.eval(conductivity);
        let velocity = direction * speed;
        let target_radius = self.radius_scale * c.radius.eval(conductivity);
        let radius = prev.radius + bounded_growth(prev.radius, target_radius, speed, dt);
        let position = prev.position + (prev.velocity + velocity) * (0.5 * dt);

        next_state(prev, position, velocity, radius, conductivity, length)
    }
}
