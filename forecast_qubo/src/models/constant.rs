//! Deterministic stub forecaster

use crate::error::{PipelineError, Result};
use crate::models::{check_window, window_length_of, Forecaster};
use crate::window::TrainingWindow;

/// Returns a fixed value once trained
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantForecaster {
    value: f64,
    window_length: Option<usize>,
}

impl ConstantForecaster {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            window_length: None,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Forecaster for ConstantForecaster {
    fn name(&self) -> &str {
        "Constant"
    }

    fn train(&mut self, windows: &[TrainingWindow]) -> Result<()> {
        self.window_length = Some(window_length_of(windows)?);
        Ok(())
    }

    fn predict(&self, latest_window: &[f64]) -> Result<f64> {
        let expected = self.window_length.ok_or_else(|| {
            PipelineError::ModelNotTrained("Constant forecaster has not been trained".to_string())
        })?;
        check_window(self.name(), expected, latest_window)?;
        Ok(self.value)
    }

    fn is_trained(&self) -> bool {
        self.window_length.is_some()
    }
}
