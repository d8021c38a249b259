//! Forecast accuracy and stage quality scores

use crate::error::{PipelineError, Result};
use crate::models::Forecaster;
use crate::qubo::QuboModel;
use crate::samples::SampleSet;
use crate::window::TrainingWindow;
use serde::Serialize;
use std::fmt;

/// Forecast accuracy metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, zero actuals skipped
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

impl fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE {:.4}, MSE {:.4}, RMSE {:.4}, MAPE {:.2}%, SMAPE {:.2}%",
            self.mae, self.mse, self.rmse, self.mape, self.smape
        )
    }
}

/// Calculate accuracy metrics for a forecast vs actual values
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(PipelineError::InvalidParameter(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = forecast.len() as f64;
    let errors: Vec<f64> = forecast.iter().zip(actual).map(|(&f, &a)| a - f).collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;
    let rmse = mse.sqrt();

    let mape = actual
        .iter()
        .zip(&errors)
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &e)| (e.abs() / a.abs()) * 100.0)
        .sum::<f64>()
        / n;

    let smape = actual
        .iter()
        .zip(forecast)
        .map(|(&a, &f)| {
            let denom = a.abs() + f.abs();
            if denom == 0.0 {
                0.0
            } else {
                200.0 * (a - f).abs() / denom
            }
        })
        .sum::<f64>()
        / n;

    Ok(ForecastAccuracy {
        mae,
        mse,
        rmse,
        mape,
        smape,
    })
}

/// Accuracy of a trained forecaster over the last `count` windows
///
/// Uses every window when fewer than `count` are available.
pub fn evaluate_forecaster<F: Forecaster + ?Sized>(
    forecaster: &F,
    windows: &[TrainingWindow],
    count: usize,
) -> Result<ForecastAccuracy> {
    let start = windows.len().saturating_sub(count);
    let tail = &windows[start..];

    let mut predicted = Vec::with_capacity(tail.len());
    for window in tail {
        predicted.push(forecaster.predict(window.features())?);
    }
    let actual: Vec<f64> = tail.iter().map(|w| w.target()).collect();

    forecast_accuracy(&predicted, &actual)
}

/// Score in `(0, 100]` that falls as the RMSE grows
pub fn forecast_score(accuracy: &ForecastAccuracy) -> f64 {
    100.0 / (1.0 + accuracy.rmse)
}

/// Where the best sample sits between the model's energy bounds, in `[0, 100]`
///
/// 100 means the best sample reaches the lower bound. The best sample is
/// re-evaluated under `model`; when it does not cover the model's variables
/// the solver-reported energy is used instead.
pub fn optimization_score(model: &QuboModel, samples: &SampleSet) -> f64 {
    let best = match samples.best() {
        Some(best) => best,
        None => return 0.0,
    };

    let (lower, upper) = model.energy_bounds();
    if upper == lower {
        return 100.0;
    }

    let energy = model.energy(&best.sample).unwrap_or(best.energy);
    (100.0 * (upper - energy) / (upper - lower)).clamp(0.0, 100.0)
}
