//! Time series handling for forecasting

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use market_data::Bar;
use serde::{Deserialize, Serialize};
use trade_math::volatility::{ewma_variance, rolling_volatility, simple_returns};

/// Ordered, immutable sequence of finite observations
///
/// When timestamps are present they are strictly increasing and there is one
/// per value.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    values: Vec<f64>,
    timestamps: Option<Vec<DateTime<Utc>>>,
}

impl TimeSeries {
    /// Create a timestamped series
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "Timestamps length ({}) doesn't match values length ({})",
                timestamps.len(),
                values.len()
            )));
        }
        if let Some(i) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(PipelineError::InvalidParameter(format!(
                "Timestamps must be strictly increasing (index {} is not after index {})",
                i + 1,
                i
            )));
        }
        check_finite(&values)?;

        Ok(Self {
            values,
            timestamps: Some(timestamps),
        })
    }

    /// Create a series from raw values without timestamps
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        check_finite(&values)?;
        Ok(Self {
            values,
            timestamps: None,
        })
    }

    /// Close prices of a bar sequence
    pub fn from_bars(bars: &[Bar]) -> Result<Self> {
        let timestamps = bars.iter().map(|bar| bar.timestamp).collect();
        let values = market_data::close_prices(bars);
        Self::new(timestamps, values)
    }

    /// Get the observations
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the timestamps, if available
    pub fn timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.timestamps.as_deref()
    }

    /// Get the length of the time series
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the time series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The trailing `window` observations
    pub fn latest(&self, window: usize) -> Result<&[f64]> {
        trailing(&self.values, window)
    }
}

/// The last `window` elements of `values`
pub fn trailing(values: &[f64], window: usize) -> Result<&[f64]> {
    if window == 0 || window > values.len() {
        return Err(PipelineError::InsufficientData(format!(
            "Cannot take the latest {} observations of a series of length {}",
            window,
            values.len()
        )));
    }
    Ok(&values[values.len() - window..])
}

fn check_finite(values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(PipelineError::InvalidParameter(format!(
            "Observation {} is not finite ({})",
            i, values[i]
        ))),
        None => Ok(()),
    }
}

/// Quantity the forecaster is trained to predict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForecastTarget {
    /// The observations themselves (close prices)
    #[default]
    Close,
    /// Rolling standard deviation of simple returns over `window` returns
    RealizedVolatility { window: usize },
    /// Square root of the exponentially weighted variance of returns
    EwmaVolatility { lambda: f64 },
}

impl ForecastTarget {
    /// Derive the series to window and train on
    pub fn apply(&self, series: &TimeSeries) -> Result<Vec<f64>> {
        match *self {
            ForecastTarget::Close => Ok(series.values().to_vec()),
            ForecastTarget::RealizedVolatility { window } => {
                Ok(rolling_volatility(series.values(), window)?)
            }
            ForecastTarget::EwmaVolatility { lambda } => {
                let returns = simple_returns(series.values())?;
                Ok(ewma_variance(&returns, lambda)?
                    .into_iter()
                    .map(f64::sqrt)
                    .collect())
            }
        }
    }
}
