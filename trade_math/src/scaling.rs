//! Min-max scaling

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Maps values linearly from `[min, max]` onto `[0, 1]`
///
/// A constant input (`min == max`) maps every value to `0.0` and inverts back
/// to `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit the scaler to the range of `values`
    pub fn fit<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut seen = false;

        for value in values {
            if !value.is_finite() {
                return Err(MathError::InvalidInput(format!(
                    "Cannot scale non-finite value {}",
                    value
                )));
            }
            min = min.min(value);
            max = max.max(value);
            seen = true;
        }

        if !seen {
            return Err(MathError::InsufficientData(
                "Cannot fit a scaler to no values".to_string(),
            ));
        }

        Ok(Self { min, max })
    }

    fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Scale one value
    pub fn transform(&self, value: f64) -> f64 {
        let span = self.span();
        if span == 0.0 {
            0.0
        } else {
            (value - self.min) / span
        }
    }

    /// Scale every value of a slice
    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform(v)).collect()
    }

    /// Map a scaled value back to the original range
    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.span() + self.min
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
