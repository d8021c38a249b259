//! Moving averages over slices
//!
//! Helpers that reduce a window of observations to a smoothed level, plus the
//! exponential series the EMA level is taken from.

use crate::{MathError, Result};

fn check_period(period: usize) -> Result<()> {
    if period == 0 {
        return Err(MathError::InvalidInput(
            "Period must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn check_finite(values: &[f64]) -> Result<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(v) => Err(MathError::InvalidInput(format!(
            "Moving average input must be finite, got {}",
            v
        ))),
        None => Ok(()),
    }
}

/// Mean of the trailing `period` values of `values`
pub fn trailing_sma(values: &[f64], period: usize) -> Result<f64> {
    check_period(period)?;
    if values.len() < period {
        return Err(MathError::InsufficientData(format!(
            "Need {} values for a moving average, have {}",
            period,
            values.len()
        )));
    }
    let tail = &values[values.len() - period..];
    check_finite(tail)?;
    crate::mean(tail)
}

/// Smoothing factor `2 / (period + 1)` of an EMA
pub fn ema_alpha(period: usize) -> Result<f64> {
    check_period(period)?;
    Ok(2.0 / (period as f64 + 1.0))
}

/// Exponentially smoothed series, seeded with the first value
pub fn ema_series(values: &[f64], period: usize) -> Result<Vec<f64>> {
    let alpha = ema_alpha(period)?;
    check_finite(values)?;

    let mut level = match values.first() {
        Some(&first) => first,
        None => {
            return Err(MathError::InsufficientData(
                "Cannot smooth an empty series".to_string(),
            ))
        }
    };
    Ok(values
        .iter()
        .map(|&v| {
            level += alpha * (v - level);
            level
        })
        .collect())
}

/// Final level of [`ema_series`]
pub fn ema_of(values: &[f64], period: usize) -> Result<f64> {
    let series = ema_series(values, period)?;
    series.last().copied().ok_or_else(|| {
        MathError::CalculationError("Smoothed series is empty".to_string())
    })
}
