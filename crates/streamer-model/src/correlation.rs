//! Empirical correlations mapping one channel quantity to another.
//!
//! Every correlation is a closed-form fit with opaque coefficients. The
//! defaults were fitted to detailed fluid simulations of positive
//! streamers in air and are expressed in SI units.

/// A one-dimensional empirical fit `y = f(x)`, clamped at zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Correlation {
    /// `a + b·x`
    Affine {
        /// Intercept.
        a: f64,
        /// Slope.
        b: f64,
    },
    /// `sqrt(max(0, a + b·x))`
    SqrtAffine {
        /// Intercept under the root.
        a: f64,
        /// Slope under the root.
        b: f64,
    },
}

impl Correlation {
    /// Evaluate at `x`. The result is never negative.
    pub fn eval(&self, x: f64) -> f64 {
        match *self {
            Self::Affine { a, b } => (a + b * x).max(0.0),
            Self::SqrtAffine { a, b } => (a + b * x).max(0.0).sqrt(),
        }
    }

    /// Substitute an affine inner map: `self(c + d·x)`.
    ///
    /// The inner map is not clamped, so composing fits keeps the exact
    /// algebraic form of the outer one.
    pub fn compose_affine(&self, c: f64, d: f64) -> Self {
        match *self {
            Self::Affine { a, b } => Self::Affine {
                a: a + b * c,
                b: b * d,
            },
            Self::SqrtAffine { a, b } => Self::SqrtAffine {
                a: a + b * c,
                b: b * d,
            },
        }
    }

    /// True if every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        match *self {
            Self::Affine { a, b } | Self::SqrtAffine { a, b } => a.is_finite() && b.is_finite(),
        }
    }
}

/// Conductivity as a function of the high-field length, `sigma(L_E)`.
pub const CONDUCTIVITY_FROM_LENGTH: Correlation = Correlation::Affine {
    a: -3.923_462_954_787_772_7e-7,
    b: 1.543_686_303_223_241_5e-3,
};

/// Head speed as a function of conductivity, `v(sigma)`.
pub const SPEED_FROM_CONDUCTIVITY: Correlation = Correlation::Affine {
    a: 318_891.664_900_661_1,
    b: 1.417_943_826_064_345e12,
};

/// Channel radius as a function of conductivity, `R(sigma)`.
pub const RADIUS_FROM_CONDUCTIVITY: Correlation = Correlation::SqrtAffine {
    a: 6.786_620_433_843_93e-8,
    b: 0.613_331_433_631_289_8,
};

/// Fits driven directly by the high-field length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LengthCorrelations {
    /// `sigma(L_E)`.
    pub conductivity: Correlation,
    /// `|v|(L_E)`.
    pub speed: Correlation,
    /// `R(L_E)`.
    pub radius: Correlation,
}

impl Default for LengthCorrelations {
    /// The conductivity fit, with speed and radius obtained by composing
    /// the conductivity-based fits with it.
    fn default() -> Self {
        let (c, d) = match CONDUCTIVITY_FROM_LENGTH {
            Correlation::Affine { a, b } | Correlation::SqrtAffine { a, b } => (a, b),
        };
        Self {
            conductivity: CONDUCTIVITY_FROM_LENGTH,
            speed: SPEED_FROM_CONDUCTIVITY.compose_affine(c, d),
            radius: RADIUS_FROM_CONDUCTIVITY.compose_affine(c, d),
        }
    }
}

/// Fits used by the conductivity-driven model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConductivityCorrelations {
    /// Conductivity the head relaxes towards, `sigma_target(L_E)`.
    pub target: Correlation,
    /// `|v|(sigma)`.
    pub speed: Correlation,
    /// `R(sigma)`.
    pub radius: Correlation,
}

impl Default for ConductivityCorrelations {
    fn default() -> Self {
        Self {
            target: CONDUCTIVITY_FROM_LENGTH,
            speed: SPEED_FROM_CONDUCTIVITY,
            radius: RADIUS_FROM_CONDUCTIVITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1e-300)
    }

    #[test]
    fn eval_clamps_at_zero() {
        let c = Correlation::Affine { a: -1.0, b: 1.0 };
        assert_eq!(c.eval(0.5), 0.0);
        assert_eq!(c.eval(3.0), 2.0);
        let r = Correlation::SqrtAffine { a: -1.0, b: 1.0 };
        assert_eq!(r.eval(0.0), 0.0);
        assert_eq!(r.eval(5.0), 2.0);
    }

    #[test]
    fn composed_defaults_match_chained_evaluation() {
        let set = LengthCorrelations::default();
        for length in [3e-4, 1e-3, 4e-3] {
            let sigma = CONDUCTIVITY_FROM_LENGTH.eval(length);
            assert!(close(set.speed.eval(length), SPEED_FROM_CONDUCTIVITY.eval(sigma)));
            assert!(close(set.radius.eval(length), RADIUS_FROM_CONDUCTIVITY.eval(sigma)));
        }
    }

    #[test]
    fn composed_speed_coefficients() {
        match LengthCorrelations::default().speed {
            Correlation::Affine { a, b } => {
                assert!((a - -237_430.0).abs() < 100.0, "a = {a}");
                assert!((b - 2.188_85e9).abs() < 1e5, "b = {b}");
            }
            other => panic!("expected Affine, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_increasing_in_length() {
        let set = LengthCorrelations::default();
        assert!(set.conductivity.eval(2e-3) > set.conductivity.eval(1e-3));
        assert!(set.speed.eval(2e-3) > set.speed.eval(1e-3));
        assert!(set.radius.eval(2e-3) > set.radius.eval(1e-3));
        assert!(set.conductivity.is_finite());
    }
}
