//! Return and volatility series
//!
//! Used to turn a price series into the volatility series a forecaster can be
//! trained on.

use crate::{MathError, Result};

/// Simple one-step returns `p[i+1] / p[i] - 1`
pub fn simple_returns(prices: &[f64]) -> Result<Vec<f64>> {
    if prices.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Need at least 2 prices to compute returns, have {}",
            prices.len()
        )));
    }

    prices
        .windows(2)
        .map(|w| {
            if w[0] == 0.0 {
                Err(MathError::CalculationError(
                    "Cannot compute a return from a zero price".to_string(),
                ))
            } else {
                Ok(w[1] / w[0] - 1.0)
            }
        })
        .collect()
}

/// Population standard deviation of a slice
pub fn std_dev(values: &[f64]) -> Result<f64> {
    let mean = crate::mean(values)?;
    let variance = values.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Ok(variance.sqrt())
}

/// Rolling standard deviation of simple returns
///
/// Element `k` is the volatility of returns `k..k+window`, so the output has
/// `prices.len() - window` elements.
pub fn rolling_volatility(prices: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Volatility window must be greater than zero".to_string(),
        ));
    }

    let returns = simple_returns(prices)?;
    if returns.len() < window {
        return Err(MathError::InsufficientData(format!(
            "Need at least {} returns for a volatility window of {}, have {}",
            window,
            window,
            returns.len()
        )));
    }

    returns.windows(window).map(std_dev).collect()
}

/// Exponentially weighted variance of returns (RiskMetrics style)
pub fn ewma_variance(returns: &[f64], lambda: f64) -> Result<Vec<f64>> {
    if !(0.0..1.0).contains(&lambda) {
        return Err(MathError::InvalidInput(format!(
            "Lambda must be in [0, 1), got {}",
            lambda
        )));
    }
    if returns.is_empty() {
        return Ok(Vec::new());
    }

    let mut variance = Vec::with_capacity(returns.len());
    variance.push(returns[0].powi(2));
    for i in 1..returns.len() {
        let next = lambda * variance[i - 1] + (1.0 - lambda) * returns[i].powi(2);
        variance.push(next);
    }

    Ok(variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_simple_returns() {
        let returns = simple_returns(&[100.0, 110.0, 99.0]).unwrap();
        assert_eq!(returns.len(), 2);
        assert_relative_eq!(returns[0], 0.1);
        assert_relative_eq!(returns[1], -0.1);

        assert!(simple_returns(&[100.0]).is_err());
        assert!(simple_returns(&[0.0, 1.0]).is_err());
    }

    #[test]
    fn test_rolling_volatility_length_and_sign() {
        let prices = [100.0, 101.0, 100.5, 102.0, 100.0, 103.0, 99.0, 105.0];
        let vol = rolling_volatility(&prices, 3).unwrap();

        assert_eq!(vol.len(), prices.len() - 3);
        assert!(vol.iter().all(|v| *v > 0.0));

        assert!(rolling_volatility(&prices, 0).is_err());
        assert!(rolling_volatility(&prices, 8).is_err());
    }

    #[test]
    fn test_flat_prices_have_zero_volatility() {
        let vol = rolling_volatility(&[5.0; 6], 2).unwrap();
        assert!(vol.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_ewma_variance() {
        let variance = ewma_variance(&[0.1, 0.0], 0.5).unwrap();
        assert_relative_eq!(variance[0], 0.01);
        assert_relative_eq!(variance[1], 0.005);
        assert!(ewma_variance(&[0.1], 1.0).is_err());
    }
}
