//! Effective ionization-rate lookup table (k_eff versus field strength).
//!
//! The table maps electric field magnitude (V/m) to the effective
//! ionization rate (1/s). It defines the "high-field" threshold used by
//! the length estimator and is also forwarded to the field solver.

use std::path::Path;

use crate::error::TableError;

/// Monotonic field → rate table with linear interpolation.
///
/// Field breakpoints are strictly increasing. Rates are monotonic in
/// either direction. Lookups outside the table return the edge values.
#[derive(Clone, Debug, PartialEq)]
pub struct IonizationTable {
    fields: Vec<f64>,
    rates: Vec<f64>,
    increasing: bool,
}

impl IonizationTable {
    /// Build a table from two columns, validating every invariant.
    pub fn from_columns(fields: Vec<f64>, rates: Vec<f64>) -> Result<Self, TableError> {
        if fields.len() != rates.len() {
            return Err(TableError::LengthMismatch {
                fields: fields.len(),
                rates: rates.len(),
            });
        }
        if fields.len() < 2 {
            return Err(TableError::TooFewPoints {
                count: fields.len(),
            });
        }
        if let Some(index) = fields
            .iter()
            .zip(rates.iter())
            .position(|(e, k)| !e.is_finite() || !k.is_finite())
        {
            return Err(TableError::NonFinite { index });
        }
        if let Some(i) = fields.windows(2).position(|w| w[1] <= w[0]) {
            return Err(TableError::NonMonotonic { index: i + 1 });
        }

        let increasing = rates[rates.len() - 1] >= rates[0];
        let broken = rates.windows(2).position(|w| {
            if increasing {
                w[1] < w[0]
            } else {
                w[1] > w[0]
            }
        });
        if let Some(i) = broken {
            return Err(TableError::NonMonotonic { index: i + 1 });
        }

        Ok(Self {
            fields,
            rates,
            increasing,
        })
    }

    /// Parse a whitespace-separated two-column table.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let mut fields = Vec::new();
        let mut rates = Vec::new();
        for (n, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() != 2 {
                return Err(TableError::Parse {
                    line: n + 1,
                    reason: format!("expected 2 columns, found {}", cols.len()),
                });
            }
            let parse = |s: &str| {
                s.parse::<f64>().map_err(|e| TableError::Parse {
                    line: n + 1,
                    reason: format!("'{s}': {e}"),
                })
            };
            fields.push(parse(cols[0])?);
            rates.push(parse(cols[1])?);
        }
        Self::from_columns(fields, rates)
    }

    /// Read and parse a table file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TableError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&text)
    }

    /// Field breakpoints (V/m).
    pub fn fields(&self) -> &[f64] {
        &self.fields
    }

    /// Rate values (1/s).
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; a valid table has at least two rows.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Effective ionization rate at field magnitude `field`.
    pub fn rate(&self, field: f64) -> f64 {
        let n = self.fields.len();
        if field <= self.fields[0] {
            return self.rates[0];
        }
        if field >= self.fields[n - 1] {
            return self.rates[n - 1];
        }
        // First breakpoint strictly above `field`; 1 <= hi <= n-1 here.
        let hi = self.fields.partition_point(|&e| e <= field);
        let lo = hi - 1;
        let t = (field - self.fields[lo]) / (self.fields[hi] - self.fields[lo]);
        self.rates[lo] + t * (self.rates[hi] - self.rates[lo])
    }

    /// Field magnitude at which the rate first reaches `cutoff`.
    ///
    /// For an increasing table this is the lowest field whose rate is at
    /// least `cutoff`; for a decreasing table, the lowest field whose rate
    /// is at most `cutoff`. Cutoffs beyond the table return edge fields.
    pub fn threshold_field(&self, cutoff: f64) -> f64 {
        let reached = |k: f64| {
            if self.increasing {
                k >= cutoff
            } else {
                k <= cutoff
            }
        };
        let n = self.fields.len();
        if reached(self.rates[0]) {
            return self.fields[0];
        }
        match self.rates.iter().position(|&k| reached(k)) {
            None => self.fields[n - 1],
            Some(hi) => {
                let lo = hi - 1;
                let dk = self.rates[hi] - self.rates[lo];
                let t = if dk == 0.0 {
                    0.0
                } else {
                    (cutoff - self.rates[lo]) / dk
                };
                self.fields[lo] + t * (self.fields[hi] - self.fields[lo])
            }
        }
    }
}
