//! High-field length (L_E) extraction from a sampled field profile.
//!
//! Each step the estimator:
//!
//! 1. finds where `|E|` first drops below the threshold field, linearly
//!    interpolated between the bracketing samples;
//! 2. applies the optional resolution-bias correction
//!    `L_E += c0·(h_data − h)`;
//! 3. clamps above by `L_E_max`;
//! 4. reports [`RemovalCause::FeatureBelowFloor`] when the raw value is
//!    below `L_E_min`;
//! 5. smooths `L_E = α·raw + (1 − α)·L_E_prev` (first estimate is raw);
//! 6. clamps the smoothed value into `[L_E_min, L_E_max]`.
//!
//! Constructed via the builder pattern: [`HighFieldLengthEstimator::builder`].

use streamer_core::{LineSample, RemovalCause};

/// Linear correction for grid-resolution bias in the extracted length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolutionBias {
    /// Coefficient `c0` (dimensionless).
    pub coefficient: f64,
    /// Grid spacing the correlations were calibrated on (m).
    pub data_spacing: f64,
}

impl ResolutionBias {
    /// Correct `length` measured on a grid of spacing `spacing`.
    pub fn apply(&self, length: f64, spacing: f64) -> f64 {
        length + self.coefficient * (self.data_spacing - spacing)
    }
}

/// A successful estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LengthEstimate {
    /// Corrected, upper-clamped raw length (m).
    pub raw: f64,
    /// Smoothed length handed to the correlations (m).
    pub smoothed: f64,
}

/// Extracts and smooths the high-field length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighFieldLengthEstimator {
    threshold: f64,
    min_length: f64,
    max_length: f64,
    alpha: f64,
    bias: Option<ResolutionBias>,
}

/// Builder for [`HighFieldLengthEstimator`].
///
/// Required field: `threshold`.
#[derive(Clone, Debug)]
pub struct HighFieldLengthEstimatorBuilder {
    threshold: Option<f64>,
    min_length: f64,
    max_length: f64,
    alpha: f64,
    bias: Option<ResolutionBias>,
}

impl HighFieldLengthEstimator {
    /// Create a new builder.
    pub fn builder() -> HighFieldLengthEstimatorBuilder {
        HighFieldLengthEstimatorBuilder {
            threshold: None,
            min_length: 1e-4,
            max_length: 5e-3,
            alpha: 1.0,
            bias: None,
        }
    }

    /// Threshold field (V/m).
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `L_E_min` (m).
    pub fn min_length(&self) -> f64 {
        self.min_length
    }

    /// `L_E_max` (m).
    pub fn max_length(&self) -> f64 {
        self.max_length
    }

    /// Smoothing factor α.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Distance from the first sample to the first threshold crossing.
    ///
    /// Zero if the first sample is already below threshold; the full
    /// sampled distance if the profile never drops below it. Returns
    /// `None` for an unusable sample.
    pub fn raw_length(&self, sample: &LineSample) -> Option<f64> {
        if !sample.is_usable() {
            return None;
        }
        let s = &sample.coordinates;
        let e = &sample.values;
        let origin = s[0];
        if e[0] < self.threshold {
            return Some(0.0);
        }
        for i in 1..e.len() {
            if e[i] < self.threshold {
                // e[i-1] >= threshold > e[i], so the denominator is positive.
                let t = (e[i - 1] - self.threshold) / (e[i - 1] - e[i]);
                return Some(s[i - 1] + t * (s[i] - s[i - 1]) - origin);
            }
        }
        Some(s[s.len() - 1] - origin)
    }

    /// Apply the resolution-bias correction (identity when unset) and the
    /// upper clamp.
    pub fn corrected(&self, raw: f64, spacing: f64) -> f64 {
        let length = match self.bias {
            Some(bias) => bias.apply(raw, spacing),
            None => raw,
        };
        length.min(self.max_length)
    }

    /// Exponential smoothing and clamp into `[L_E_min, L_E_max]`.
    pub fn smooth(&self, raw: f64, previous: Option<f64>) -> f64 {
        let smoothed = match previous {
            None => raw,
            Some(prev) => self.alpha * raw + (1.0 - self.alpha) * prev,
        };
        smoothed.clamp(self.min_length, self.max_length)
    }

    /// Full estimate for one streamer.
    ///
    /// `spacing` is the solver's finest grid spacing and `previous` the
    /// streamer's last smoothed length.
    pub fn estimate(
        &self,
        sample: &LineSample,
        spacing: f64,
        previous: Option<f64>,
    ) -> Result<LengthEstimate, RemovalCause> {
        let raw = self
            .raw_length(sample)
            .ok_or(RemovalCause::SamplingFailure)?;
        let raw = self.corrected(raw, spacing);
        if raw < self.min_length {
            return Err(RemovalCause::FeatureBelowFloor {
                length: raw,
                floor: self.min_length,
            });
        }
        Ok(LengthEstimate {
            raw,
            smoothed: self.smooth(raw, previous),
        })
    }
}

impl HighFieldLengthEstimatorBuilder {
    /// Set the threshold field in V/m. Required.
    pub fn threshold(mut self, field: f64) -> Self {
        self.threshold = Some(field);
        self
    }

    /// Set `L_E_min` (default: 1e-4 m).
    pub fn min_length(mut self, length: f64) -> Self {
        self.min_length = length;
        self
    }

    /// Set `L_E_max` (default: 5e-3 m).
    pub fn max_length(mut self, length: f64) -> Self {
        self.max_length = length;
        self
    }

    /// Set the smoothing factor α in `(0, 1]` (default: 1, no smoothing).
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Enable the resolution-bias correction.
    pub fn resolution_bias(mut self, coefficient: f64, data_spacing: f64) -> Self {
        self.bias = Some(ResolutionBias {
            coefficient,
            data_spacing,
        });
        self
    }

    /// Build the estimator, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `threshold` is not set, negative or non-finite
    /// - `min_length` is negative or not below `max_length`
    /// - `alpha` is outside `(0, 1]`
    /// - the bias coefficients are non-finite
    pub fn build(self) -> Result<HighFieldLengthEstimator, String> {
        let threshold = self
            .threshold
            .ok_or_else(|| "threshold is required".to_string())?;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(format!("threshold must be finite and >= 0, got {threshold}"));
        }
        if !self.min_length.is_finite() || self.min_length < 0.0 {
            return Err(format!(
                "min_length must be finite and >= 0, got {}",
                self.min_length
            ));
        }
        if !self.max_length.is_finite() || self.max_length <= self.min_length {
            return Err(format!(
                "max_length must be finite and > min_length ({}), got {}",
                self.min_length, self.max_length
            ));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(format!("alpha must be in (0, 1], got {}", self.alpha));
        }
        if let Some(bias) = self.bias {
            if !bias.coefficient.is_finite() || !bias.data_spacing.is_finite() {
                return Err("resolution bias coefficients must be finite".to_string());
            }
        }
        Ok(HighFieldLengthEstimator {
            threshold,
            min_length: self.min_length,
            max_length: self.max_length,
            alpha: self.alpha,
            bias: self.bias,
        })
    }
}
