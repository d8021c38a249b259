//! Forecasting models trained on fixed-length windows

use crate::error::{PipelineError, Result};
use crate::window::TrainingWindow;

pub mod constant;
pub mod linear;
pub mod moving_average;
pub mod sequence;

pub use constant::ConstantForecaster;
pub use linear::LinearSequenceModel;
pub use moving_average::{MovingAverageForecaster, Smoothing};
pub use sequence::{FitOptions, FitReport, SequenceForecaster, SequenceModel};

/// A model that maps one window of observations to the next value
///
/// Each instance owns its trained state. `predict` fails with
/// [`PipelineError::ModelNotTrained`] until `train` has succeeded.
pub trait Forecaster {
    /// Get the name of the forecaster
    fn name(&self) -> &str;

    /// Fit the forecaster to a set of training windows
    fn train(&mut self, windows: &[TrainingWindow]) -> Result<()>;

    /// Predict the value following `latest_window`
    fn predict(&self, latest_window: &[f64]) -> Result<f64>;

    fn is_trained(&self) -> bool;
}

impl<F: Forecaster + ?Sized> Forecaster for Box<F> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn train(&mut self, windows: &[TrainingWindow]) -> Result<()> {
        (**self).train(windows)
    }

    fn predict(&self, latest_window: &[f64]) -> Result<f64> {
        (**self).predict(latest_window)
    }

    fn is_trained(&self) -> bool {
        (**self).is_trained()
    }
}

/// Common window length of a training set
pub(crate) fn window_length_of(windows: &[TrainingWindow]) -> Result<usize> {
    let first = windows.first().ok_or_else(|| {
        PipelineError::InsufficientData("Cannot train on an empty window set".to_string())
    })?;
    let length = first.features().len();

    if let Some(bad) = windows.iter().find(|w| w.features().len() != length) {
        return Err(PipelineError::InvalidParameter(format!(
            "Training windows have mixed lengths ({} and {})",
            length,
            bad.features().len()
        )));
    }

    Ok(length)
}

/// Reject a prediction window whose length differs from the trained one
pub(crate) fn check_window(name: &str, expected: usize, window: &[f64]) -> Result<()> {
    if window.len() != expected {
        return Err(PipelineError::InvalidParameter(format!(
            "{} was trained on windows of length {}, got {}",
            name,
            expected,
            window.len()
        )));
    }
    if window.iter().any(|v| !v.is_finite()) {
        return Err(PipelineError::InvalidParameter(
            "Prediction window contains non-finite values".to_string(),
        ));
    }
    Ok(())
}
