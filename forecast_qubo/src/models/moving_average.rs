//! Moving average forecaster with a learned bias

use crate::error::{PipelineError, Result};
use crate::models::{check_window, window_length_of, Forecaster};
use crate::window::TrainingWindow;
use serde::{Deserialize, Serialize};
use trade_math::moving_averages::{ema_of, trailing_sma};

/// How the latest window is smoothed into a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Smoothing {
    #[default]
    Simple,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fitted {
    window_length: usize,
    bias: f64,
}

/// Predicts the smoothed level of the latest window plus the mean training residual
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageForecaster {
    name: String,
    smoothing: Smoothing,
    fitted: Option<Fitted>,
}

impl MovingAverageForecaster {
    pub fn new(smoothing: Smoothing) -> Self {
        let name = match smoothing {
            Smoothing::Simple => "Simple Moving Average",
            Smoothing::Exponential => "Exponential Moving Average",
        };
        Self {
            name: name.to_string(),
            smoothing,
            fitted: None,
        }
    }

    /// Learned offset between the smoothed level and the next value
    pub fn bias(&self) -> Option<f64> {
        self.fitted.map(|f| f.bias)
    }

    fn level(&self, window: &[f64]) -> Result<f64> {
        let level = match self.smoothing {
            Smoothing::Simple => trailing_sma(window, window.len())?,
            Smoothing::Exponential => ema_of(window, window.len())?,
        };
        Ok(level)
    }
}

impl Default for MovingAverageForecaster {
    fn default() -> Self {
        Self::new(Smoothing::Simple)
    }
}

impl Forecaster for MovingAverageForecaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn train(&mut self, windows: &[TrainingWindow]) -> Result<()> {
        let window_length = window_length_of(windows)?;

        let mut residual_sum = 0.0;
        for window in windows {
            residual_sum += window.target() - self.level(window.features())?;
        }
        let bias = residual_sum / windows.len() as f64;

        if !bias.is_finite() {
            return Err(PipelineError::InvalidParameter(
                "Training windows produced a non-finite bias".to_string(),
            ));
        }

        log::debug!("{} trained on {} windows, bias {:.6}", self.name, windows.len(), bias);
        self.fitted = Some(Fitted {
            window_length,
            bias,
        });
        Ok(())
    }

    fn predict(&self, latest_window: &[f64]) -> Result<f64> {
        let fitted = self.fitted.ok_or_else(|| {
            PipelineError::ModelNotTrained(format!("{} has not been trained", self.name))
        })?;
        check_window(&self.name, fitted.window_length, latest_window)?;
        Ok(self.level(latest_window)? + fitted.bias)
    }

    fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowBuilder;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_trend_bias() {
        // mean of [k, k+1, k+2] is k+1, next value is k+3
        let series: Vec<f64> = (0..20).map(|v| v as f64).collect();
        let windows = WindowBuilder::new(3).unwrap().build_from_slice(&series).unwrap();

        let mut forecaster = MovingAverageForecaster::default();
        forecaster.train(&windows).unwrap();

        assert_relative_eq!(forecaster.bias().unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(
            forecaster.predict(&[20.0, 21.0, 22.0]).unwrap(),
            23.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_constant_series_has_zero_bias() {
        let windows = WindowBuilder::new(4)
            .unwrap()
            .build_from_slice(&[5.0; 12])
            .unwrap();

        let mut forecaster = MovingAverageForecaster::new(Smoothing::Exponential);
        forecaster.train(&windows).unwrap();

        assert_relative_eq!(forecaster.predict(&[5.0; 4]).unwrap(), 5.0);
    }

    #[test]
    fn test_untrained_and_wrong_length() {
        let mut forecaster = MovingAverageForecaster::default();
        assert!(matches!(
            forecaster.predict(&[1.0]),
            Err(PipelineError::ModelNotTrained(_))
        ));

        let windows = WindowBuilder::new(2)
            .unwrap()
            .build_from_slice(&[1.0, 2.0, 3.0])
            .unwrap();
        forecaster.train(&windows).unwrap();
        assert!(matches!(
            forecaster.predict(&[1.0]),
            Err(PipelineError::InvalidParameter(_))
        ));
    }
}
