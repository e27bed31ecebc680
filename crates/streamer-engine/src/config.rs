//! Simulation configuration, validation, and error types.
//!
//! [`SimulationConfig`] is the input for constructing a
//! [`StreamerSimulation`](crate::StreamerSimulation).
//! [`validate()`](SimulationConfig::validate) checks every numeric value
//! at startup; the `build_*` helpers turn the validated values into the
//! model components the driver owns.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use streamer_core::{DomainConfig, IonizationTable, TableError, Vector};
use streamer_model::{
    ChannelShape, ConductivityCorrelations, ConductivityDriven, ConductivityRasterizer,
    FeatureDriven, FieldProfileSampler, HighFieldLengthEstimator, LengthCorrelations,
    PropagationModel, ResolutionBias,
};

// ── ThresholdConfig ────────────────────────────────────────────────

/// How the threshold field for the high-field length is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ThresholdConfig {
    /// Field at which the ionization table's rate crosses the cutoff
    /// (1/s). A cutoff of 0 gives the breakdown field.
    TableCutoff(f64),
    /// Fixed threshold field (V/m).
    Fixed(f64),
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self::TableCutoff(0.0)
    }
}

impl ThresholdConfig {
    /// Resolve against a loaded table.
    pub fn field(&self, table: &IonizationTable) -> f64 {
        match *self {
            Self::TableCutoff(cutoff) => table.threshold_field(cutoff),
            Self::Fixed(field) => field,
        }
    }
}

// ── TableSource ────────────────────────────────────────────────────

/// Where the ionization-rate table comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum TableSource {
    /// Two-column text file.
    Path(PathBuf),
    /// Columns given directly.
    Inline {
        /// Field breakpoints (V/m), strictly increasing.
        fields: Vec<f64>,
        /// Effective ionization rate at each breakpoint (1/s).
        rates: Vec<f64>,
    },
}

impl TableSource {
    /// Load and validate the table.
    pub fn load(&self) -> Result<IonizationTable, TableError> {
        match self {
            Self::Path(path) => IonizationTable::load(path),
            Self::Inline { fields, rates } => {
                IonizationTable::from_columns(fields.clone(), rates.clone())
            }
        }
    }
}

// ── PropagationModelConfig ─────────────────────────────────────────

/// Which growth rule advances the streamers, with its coefficients.
#[derive(Clone, Debug, PartialEq)]
pub enum PropagationModelConfig {
    /// Radius, speed and conductivity read off the high-field length.
    FeatureDriven {
        /// Length-driven fits.
        correlations: LengthCorrelations,
    },
    /// Conductivity relaxes toward a length-driven target; radius and
    /// speed follow the conductivity.
    ConductivityDriven {
        /// Conductivity-driven fits.
        correlations: ConductivityCorrelations,
        /// Conductivity growth cap per second.
        rate: f64,
        /// Seed conductivity; `None` uses the target at the seed length.
        initial_conductivity: Option<f64>,
    },
}

impl Default for PropagationModelConfig {
    fn default() -> Self {
        Self::FeatureDriven {
            correlations: LengthCorrelations::default(),
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SimulationConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Domain geometry failed validation.
    InvalidDomain {
        /// Description of the problem.
        reason: String,
    },
    /// `dt` is NaN, infinite, zero, or negative.
    InvalidTimestep {
        /// The invalid value.
        value: f64,
    },
    /// `n_steps` is zero.
    NoSteps,
    /// `min_length`/`max_length` are not `0 <= min < max`.
    InvalidLengthBounds {
        /// Configured `L_E_min`.
        min: f64,
        /// Configured `L_E_max`.
        max: f64,
    },
    /// Smoothing factor outside `(0, 1]`.
    InvalidAlpha {
        /// The invalid value.
        value: f64,
    },
    /// Threshold configuration is not finite or negative.
    InvalidThreshold {
        /// Description of the problem.
        reason: String,
    },
    /// Propagation model parameters were rejected.
    InvalidModel {
        /// Description of the problem.
        reason: String,
    },
    /// Channel shape parameters were rejected.
    InvalidChannel {
        /// Description of the problem.
        reason: String,
    },
    /// Propagation direction is zero or not finite.
    InvalidDirection,
    /// Initial placement parameter is negative or not finite.
    InvalidPlacement {
        /// Description of the problem.
        reason: String,
    },
    /// Output prefix is empty.
    EmptyOutputPrefix,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { reason } => write!(f, "invalid domain: {reason}"),
            Self::InvalidTimestep { value } => {
                write!(f, "dt must be finite and positive, got {value}")
            }
            Self::NoSteps => write!(f, "n_steps must be at least 1"),
            Self::InvalidLengthBounds { min, max } => {
                write!(f, "length bounds must satisfy 0 <= min < max, got [{min}, {max}]")
            }
            Self::InvalidAlpha { value } => write!(f, "alpha must be in (0, 1], got {value}"),
            Self::InvalidThreshold { reason } => write!(f, "invalid threshold: {reason}"),
            Self::InvalidModel { reason } => write!(f, "invalid propagation model: {reason}"),
            Self::InvalidChannel { reason } => write!(f, "invalid channel shape: {reason}"),
            Self::InvalidDirection => {
                write!(f, "propagation direction must be finite and non-zero")
            }
            Self::InvalidPlacement { reason } => write!(f, "invalid initial placement: {reason}"),
            Self::EmptyOutputPrefix => write!(f, "output prefix must not be empty"),
        }
    }
}

impl Error for ConfigError {}

// ── SimulationConfig ───────────────────────────────────────────────

/// Complete configuration for one streamer run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig<const D: usize> {
    /// Domain, grid, electrode and boundary potential for the solver.
    pub domain: DomainConfig<D>,
    /// Timestep (s). Default: 2.5e-10.
    pub dt: f64,
    /// Number of propagation steps. Default: 10.
    pub n_steps: u64,
    /// Smoothing factor α for the high-field length. Default: 0.5.
    pub alpha: f64,
    /// `L_E_min` (m). Default: 1e-4.
    pub min_length: f64,
    /// `L_E_max` (m), also the sampling distance. Default: 5e-3.
    pub max_length: f64,
    /// Optional grid-resolution correction of the raw length.
    pub resolution_bias: Option<ResolutionBias>,
    /// Factor applied to correlation radii. Default: 1.2.
    pub radius_scale: f64,
    /// Threshold field selection. Default: table cutoff 0.
    pub threshold: ThresholdConfig,
    /// Ionization-rate table.
    pub table: TableSource,
    /// Prefix of exported solution tags. Default: `output/simulation_2d`.
    pub output_prefix: String,
    /// RNG seed. Default: 0.
    pub seed: u64,
    /// Growth rule. Default: feature-driven with the built-in fits.
    pub model: PropagationModelConfig,
    /// Channel representation handed to the solver. Default: head disk.
    pub channel: ChannelShape,
    /// Propagation direction, used at initialization and whenever a
    /// streamer has zero velocity. Default: the last axis.
    pub direction: Vector<D>,
    /// Initial streamer placed `offset_factor · radius0` behind the field
    /// maximum. Default: 1.
    pub offset_factor: f64,
    /// Maximum lateral offset of the initial streamer (m). Default: 0.
    pub initial_jitter: f64,
}

impl<const D: usize> SimulationConfig<D> {
    /// Configuration with default model parameters.
    pub fn new(domain: DomainConfig<D>, table: TableSource) -> Self {
        Self {
            domain,
            dt: 2.5e-10,
            n_steps: 10,
            alpha: 0.5,
            min_length: 1e-4,
            max_length: 5e-3,
            resolution_bias: None,
            radius_scale: 1.2,
            threshold: ThresholdConfig::default(),
            table,
            output_prefix: "output/simulation_2d".to_string(),
            seed: 0,
            model: PropagationModelConfig::default(),
            channel: ChannelShape::HeadDisk,
            direction: Vector::unit(D - 1),
            offset_factor: 1.0,
            initial_jitter: 0.0,
        }
    }

    /// Validate every value that does not require loading the table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.domain
            .validate()
            .map_err(|reason| ConfigError::InvalidDomain { reason })?;
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidTimestep { value: self.dt });
        }
        if self.n_steps == 0 {
            return Err(ConfigError::NoSteps);
        }
        let (min, max) = (self.min_length, self.max_length);
        if !(min.is_finite() && max.is_finite() && min >= 0.0 && min < max) {
            return Err(ConfigError::InvalidLengthBounds { min, max });
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(ConfigError::InvalidAlpha { value: self.alpha });
        }
        match self.threshold {
            ThresholdConfig::TableCutoff(c) if !c.is_finite() => {
                return Err(ConfigError::InvalidThreshold {
                    reason: format!("rate cutoff must be finite, got {c}"),
                });
            }
            ThresholdConfig::Fixed(e) if !e.is_finite() || e < 0.0 => {
                return Err(ConfigError::InvalidThreshold {
                    reason: format!("threshold field must be finite and >= 0, got {e}"),
                });
            }
            _ => {}
        }
        if self.direction.normalized().is_none() {
            return Err(ConfigError::InvalidDirection);
        }
        if !self.offset_factor.is_finite() || self.offset_factor < 0.0 {
            return Err(ConfigError::InvalidPlacement {
                reason: format!("offset_factor must be finite and >= 0, got {}", self.offset_factor),
            });
        }
        if !self.initial_jitter.is_finite() || self.initial_jitter < 0.0 {
            return Err(ConfigError::InvalidPlacement {
                reason: format!(
                    "initial_jitter must be finite and >= 0, got {}",
                    self.initial_jitter
                ),
            });
        }
        if self.output_prefix.is_empty() {
            return Err(ConfigError::EmptyOutputPrefix);
        }
        self.build_model()?;
        self.build_rasterizer()?;
        Ok(())
    }

    /// Growth rule selected by [`model`](Self::model).
    pub fn build_model(&self) -> Result<Box<dyn PropagationModel<D>>, ConfigError> {
        let invalid = |reason| ConfigError::InvalidModel { reason };
        match &self.model {
            PropagationModelConfig::FeatureDriven { correlations } => {
                let model = FeatureDriven::new(*correlations, self.radius_scale).map_err(invalid)?;
                Ok(Box::new(model))
            }
            PropagationModelConfig::ConductivityDriven {
                correlations,
                rate,
                initial_conductivity,
            } => {
                let mut builder = ConductivityDriven::builder()
                    .correlations(*correlations)
                    .radius_scale(self.radius_scale)
                    .rate(*rate);
                if let Some(sigma) = initial_conductivity {
                    builder = builder.initial_conductivity(*sigma);
                }
                Ok(Box::new(builder.build().map_err(invalid)?))
            }
        }
    }

    /// Rasterizer for [`channel`](Self::channel).
    pub fn build_rasterizer(&self) -> Result<ConductivityRasterizer<D>, ConfigError> {
        ConductivityRasterizer::new(self.channel)
            .map_err(|reason| ConfigError::InvalidChannel { reason })
    }

    /// Sampler reaching `max_length` along the configured direction.
    pub fn build_sampler(&self) -> FieldProfileSampler<D> {
        FieldProfileSampler::new(self.max_length, self.direction)
    }

    /// Estimator using `threshold` as the threshold field.
    pub fn build_estimator(&self, threshold: f64) -> Result<HighFieldLengthEstimator, ConfigError> {
        let mut builder = HighFieldLengthEstimator::builder()
            .threshold(threshold)
            .min_length(self.min_length)
            .max_length(self.max_length)
            .alpha(self.alpha);
        if let Some(bias) = self.resolution_bias {
            builder = builder.resolution_bias(bias.coefficient, bias.data_spacing);
        }
        builder
            .build()
            .map_err(|reason| ConfigError::InvalidThreshold { reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamer_test_utils::{test_domain_2d, AIR_TABLE_TEXT};

    fn inline_table() -> TableSource {
        let table = IonizationTable::parse(AIR_TABLE_TEXT).unwrap();
        TableSource::Inline {
            fields: table.fields().to_vec(),
            rates: table.rates().to_vec(),
        }
    }

    fn valid_config() -> SimulationConfig<2> {
        SimulationConfig::new(test_domain_2d(), inline_table())
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = valid_config();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.radius_scale, 1.2);
        assert_eq!(cfg.direction, Vector::unit(1));
        assert_eq!(cfg.output_prefix, "output/simulation_2d");
    }

    #[test]
    fn bad_timestep_fails() {
        let mut cfg = valid_config();
        cfg.dt = 0.0;
        match cfg.validate() {
            Err(ConfigError::InvalidTimestep { .. }) => {}
            other => panic!("expected InvalidTimestep, got {other:?}"),
        }
    }

    #[test]
    fn zero_steps_fails() {
        let mut cfg = valid_config();
        cfg.n_steps = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::NoSteps));
    }

    #[test]
    fn inverted_length_bounds_fail() {
        let mut cfg = valid_config();
        cfg.min_length = 5e-3;
        cfg.max_length = 1e-4;
        match cfg.validate() {
            Err(ConfigError::InvalidLengthBounds { .. }) => {}
            other => panic!("expected InvalidLengthBounds, got {other:?}"),
        }
    }

    #[test]
    fn alpha_outside_unit_interval_fails() {
        for alpha in [0.0, 1.5, f64::NAN] {
            let mut cfg = valid_config();
            cfg.alpha = alpha;
            match cfg.validate() {
                Err(ConfigError::InvalidAlpha { .. }) => {}
                other => panic!("expected InvalidAlpha for {alpha}, got {other:?}"),
            }
        }
    }

    #[test]
    fn zero_direction_fails() {
        let mut cfg = valid_config();
        cfg.direction = Vector::ZERO;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidDirection));
    }

    #[test]
    fn bad_domain_is_reported() {
        let mut cfg = valid_config();
        cfg.domain.electrode.radius = 0.0;
        match cfg.validate() {
            Err(ConfigError::InvalidDomain { reason }) => assert!(reason.contains("radius")),
            other => panic!("expected InvalidDomain, got {other:?}"),
        }
    }

    #[test]
    fn model_parameters_are_checked() {
        let mut cfg = valid_config();
        cfg.radius_scale = -1.0;
        match cfg.validate() {
            Err(ConfigError::InvalidModel { .. }) => {}
            other => panic!("expected InvalidModel, got {other:?}"),
        }
        let mut cfg = valid_config();
        cfg.model = PropagationModelConfig::ConductivityDriven {
            correlations: ConductivityCorrelations::default(),
            rate: 0.0,
            initial_conductivity: None,
        };
        match cfg.validate() {
            Err(ConfigError::InvalidModel { reason }) => assert!(reason.contains("rate")),
            other => panic!("expected InvalidModel, got {other:?}"),
        }
    }

    #[test]
    fn channel_spacing_is_checked() {
        let mut cfg = valid_config();
        cfg.channel = ChannelShape::RadialProfile { spacing: 0.0 };
        match cfg.validate() {
            Err(ConfigError::InvalidChannel { .. }) => {}
            other => panic!("expected InvalidChannel, got {other:?}"),
        }
    }

    #[test]
    fn placement_and_prefix_are_checked() {
        let mut cfg = valid_config();
        cfg.initial_jitter = -1e-4;
        match cfg.validate() {
            Err(ConfigError::InvalidPlacement { .. }) => {}
            other => panic!("expected InvalidPlacement, got {other:?}"),
        }
        let mut cfg = valid_config();
        cfg.output_prefix.clear();
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyOutputPrefix));
    }

    #[test]
    fn threshold_resolves_against_table() {
        let table = inline_table().load().unwrap();
        assert!((ThresholdConfig::default().field(&table) - 3e6).abs() < 1e-6);
        assert_eq!(ThresholdConfig::Fixed(4e6).field(&table), 4e6);
        let mut cfg = valid_config();
        cfg.threshold = ThresholdConfig::Fixed(-1.0);
        match cfg.validate() {
            Err(ConfigError::InvalidThreshold { .. }) => {}
            other => panic!("expected InvalidThreshold, got {other:?}"),
        }
    }

    #[test]
    fn missing_table_file_is_io_error() {
        let source = TableSource::Path(PathBuf::from("/nonexistent/streamer/table.txt"));
        match source.load() {
            Err(TableError::Io { .. }) => {}
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn estimator_carries_configured_bounds() {
        let mut cfg = valid_config();
        cfg.resolution_bias = Some(ResolutionBias {
            coefficient: 0.5,
            data_spacing: 30e-3 / 256.0,
        });
        let est = cfg.build_estimator(3e6).unwrap();
        assert_eq!(est.threshold(), 3e6);
        assert_eq!(est.min_length(), 1e-4);
        assert_eq!(est.max_length(), 5e-3);
        assert_eq!(est.alpha(), 0.5);
    }
}
