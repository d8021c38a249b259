//! Window adapter around a trainable sequence regressor
//!
//! [`SequenceForecaster`] owns the pre- and post-processing: it fits a min-max
//! scaler on the training windows, holds out the trailing validation split,
//! and hands scaled inputs to a [`SequenceModel`].

use crate::config::ForecasterConfig;
use crate::error::{PipelineError, Result};
use crate::models::{check_window, window_length_of, Forecaster};
use crate::window::TrainingWindow;
use statrs::statistics::Statistics;
use std::iter;
use trade_math::scaling::MinMaxScaler;

/// Training hyper-parameters passed to a [`SequenceModel`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: Option<u64>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            epochs: 5,
            batch_size: 32,
            learning_rate: 0.05,
            seed: None,
        }
    }
}

/// Summary of one training run
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub epochs: usize,
    /// Mean squared error on the scaled training set after the last epoch
    pub training_loss: f64,
    /// Mean squared error on the scaled held-out windows
    pub validation_loss: Option<f64>,
    pub training_windows: usize,
    pub validation_windows: usize,
    /// Mean of the unscaled training residuals
    pub residual_mean: f64,
    /// Standard deviation of the unscaled training residuals
    pub residual_std: Option<f64>,
}

/// A regressor from one scaled input vector to one scaled output
pub trait SequenceModel {
    /// Fit the model, returning the final training loss
    fn fit(&mut self, inputs: &[Vec<f64>], targets: &[f64], options: &FitOptions) -> Result<f64>;

    /// Predict one output; fails if called before `fit`
    fn predict(&self, input: &[f64]) -> Result<f64>;
}

#[derive(Debug, Clone)]
struct Trained {
    window_length: usize,
    scaler: MinMaxScaler,
    report: FitReport,
}

/// Forecaster that drives a [`SequenceModel`] over scaled windows
#[derive(Debug, Clone)]
pub struct SequenceForecaster<M: SequenceModel> {
    name: String,
    model: M,
    options: FitOptions,
    validation_split: f64,
    trained: Option<Trained>,
}

impl<M: SequenceModel> SequenceForecaster<M> {
    /// Wrap `model`; `validation_split` must lie in `[0, 1)`
    pub fn new(name: &str, model: M, options: FitOptions, validation_split: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&validation_split) {
            return Err(PipelineError::InvalidParameter(format!(
                "Validation split must be in [0, 1), got {}",
                validation_split
            )));
        }
        if options.epochs == 0 || options.batch_size == 0 {
            return Err(PipelineError::InvalidParameter(
                "Epochs and batch size must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            model,
            options,
            validation_split,
            trained: None,
        })
    }

    /// Build the adapter from the forecaster section of the pipeline configuration
    pub fn from_config(name: &str, model: M, config: &ForecasterConfig) -> Result<Self> {
        let options = FitOptions {
            epochs: config.epochs,
            batch_size: config.batch_size,
            learning_rate: config.learning_rate,
            seed: config.seed,
        };
        Self::new(name, model, options, config.validation_split)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Report of the last successful training run
    pub fn report(&self) -> Option<&FitReport> {
        self.trained.as_ref().map(|t| &t.report)
    }

    fn split_point(&self, count: usize) -> usize {
        let held_out = (count as f64 * self.validation_split).floor() as usize;
        // Always keep at least one training window
        count - held_out.min(count - 1)
    }
}

fn mse(model: &impl SequenceModel, inputs: &[Vec<f64>], targets: &[f64]) -> Result<f64> {
    let mut total = 0.0;
    for (input, &target) in inputs.iter().zip(targets) {
        total += (model.predict(input)? - target).powi(2);
    }
    Ok(total / inputs.len() as f64)
}

impl<M: SequenceModel> Forecaster for SequenceForecaster<M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn train(&mut self, windows: &[TrainingWindow]) -> Result<()> {
        let window_length = window_length_of(windows)?;

        let scaler = MinMaxScaler::fit(
            windows
                .iter()
                .flat_map(|w| w.features().iter().copied().chain(iter::once(w.target()))),
        )?;

        let inputs: Vec<Vec<f64>> = windows
            .iter()
            .map(|w| scaler.transform_all(w.features()))
            .collect();
        let targets: Vec<f64> = windows.iter().map(|w| scaler.transform(w.target())).collect();

        let split = self.split_point(windows.len());
        let (train_inputs, valid_inputs) = inputs.split_at(split);
        let (train_targets, valid_targets) = targets.split_at(split);

        let training_loss = self.model.fit(train_inputs, train_targets, &self.options)?;
        let validation_loss = if valid_inputs.is_empty() {
            None
        } else {
            Some(mse(&self.model, valid_inputs, valid_targets)?)
        };

        let mut residuals = Vec::with_capacity(split);
        for (input, window) in train_inputs.iter().zip(windows) {
            residuals.push(window.target() - scaler.inverse(self.model.predict(input)?));
        }
        let residual_mean = residuals.iter().copied().mean();
        let residual_std = if residuals.len() > 1 {
            Some(residuals.iter().copied().std_dev())
        } else {
            None
        };

        let report = FitReport {
            epochs: self.options.epochs,
            training_loss,
            validation_loss,
            training_windows: split,
            validation_windows: windows.len() - split,
            residual_mean,
            residual_std,
        };
        log::info!(
            "{} trained on {} windows: loss {:.6}, validation loss {}",
            self.name,
            report.training_windows,
            report.training_loss,
            report
                .validation_loss
                .map(|v| format!("{:.6}", v))
                .unwrap_or_else(|| "n/a".to_string())
        );

        self.trained = Some(Trained {
            window_length,
            scaler,
            report,
        });
        Ok(())
    }

    fn predict(&self, latest_window: &[f64]) -> Result<f64> {
        let trained = self.trained.as_ref().ok_or_else(|| {
            PipelineError::ModelNotTrained(format!("{} has not been trained", self.name))
        })?;
        check_window(&self.name, trained.window_length, latest_window)?;

        let scaled = trained.scaler.transform_all(latest_window);
        let output = self.model.predict(&scaled)?;
        Ok(trained.scaler.inverse(output))
    }

    fn is_trained(&self) -> bool {
        self.trained.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowBuilder;

    /// Predicts the last input unchanged
    #[derive(Debug, Default)]
    struct Persistence {
        fitted: bool,
    }

    impl SequenceModel for Persistence {
        fn fit(&mut self, inputs: &[Vec<f64>], _targets: &[f64], _options: &FitOptions) -> Result<f64> {
            assert!(!inputs.is_empty());
            self.fitted = true;
            Ok(0.0)
        }

        fn predict(&self, input: &[f64]) -> Result<f64> {
            if !self.fitted {
                return Err(PipelineError::ModelNotTrained("persistence".to_string()));
            }
            Ok(input[input.len() - 1])
        }
    }

    fn windows(n: usize, w: usize) -> Vec<TrainingWindow> {
        let series: Vec<f64> = (0..n).map(|v| 10.0 + v as f64).collect();
        WindowBuilder::new(w).unwrap().build_from_slice(&series).unwrap()
    }

    #[test]
    fn test_rejects_bad_split() {
        let err = SequenceForecaster::new("p", Persistence::default(), FitOptions::default(), 1.0);
        assert!(matches!(err, Err(PipelineError::InvalidParameter(_))));
    }

    #[test]
    fn test_prediction_is_unscaled() {
        let mut forecaster =
            SequenceForecaster::new("p", Persistence::default(), FitOptions::default(), 0.2).unwrap();
        forecaster.train(&windows(30, 5)).unwrap();

        let prediction = forecaster.predict(&[20.0, 21.0, 22.0, 23.0, 24.0]).unwrap();
        assert!((prediction - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_validation_holdout() {
        let mut forecaster =
            SequenceForecaster::new("p", Persistence::default(), FitOptions::default(), 0.2).unwrap();
        forecaster.train(&windows(30, 5)).unwrap();

        let report = forecaster.report().unwrap();
        assert_eq!(report.training_windows + report.validation_windows, 25);
        assert_eq!(report.validation_windows, 5);
        assert!(report.validation_loss.is_some());
    }

    #[test]
    fn test_single_window_keeps_training_set() {
        let mut forecaster =
            SequenceForecaster::new("p", Persistence::default(), FitOptions::default(), 0.5).unwrap();
        forecaster.train(&windows(3, 2)).unwrap();

        let report = forecaster.report().unwrap();
        assert_eq!(report.training_windows, 1);
        assert_eq!(report.validation_loss, None);
    }

    #[test]
    fn test_predict_before_train() {
        let forecaster =
            SequenceForecaster::new("p", Persistence::default(), FitOptions::default(), 0.0).unwrap();
        assert!(matches!(
            forecaster.predict(&[1.0]),
            Err(PipelineError::ModelNotTrained(_))
        ));
    }
}
