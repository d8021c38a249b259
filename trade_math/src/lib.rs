//! # Trade Math
//!
//! Numeric building blocks shared by the forecasting pipeline.
//! This crate provides moving averages, return and rolling
//! volatility series, and a min-max scaler used to normalise model inputs.

use thiserror::Error;

pub mod moving_averages;
pub mod scaling;
pub mod volatility;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Arithmetic mean of a slice, or an error when it is empty
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty slice".to_string(),
        ));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
        assert!(matches!(mean(&[]), Err(MathError::InsufficientData(_))));
    }
}
