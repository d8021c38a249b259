//! Linear regressor trained with mini-batch gradient descent

use crate::error::{PipelineError, Result};
use crate::models::sequence::{FitOptions, SequenceModel};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use statrs::statistics::Statistics;

/// `y = w · x + b`, fitted on mean squared error
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearSequenceModel {
    weights: Vec<f64>,
    bias: f64,
    fitted: bool,
}

impl LinearSequenceModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    fn output(&self, input: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(input)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias
    }

    fn loss(&self, inputs: &[Vec<f64>], targets: &[f64]) -> f64 {
        inputs
            .iter()
            .zip(targets)
            .map(|(x, &y)| (self.output(x) - y).powi(2))
            .sum::<f64>()
            / inputs.len() as f64
    }
}

impl SequenceModel for LinearSequenceModel {
    fn fit(&mut self, inputs: &[Vec<f64>], targets: &[f64], options: &FitOptions) -> Result<f64> {
        if inputs.is_empty() || inputs.len() != targets.len() {
            return Err(PipelineError::InsufficientData(format!(
                "Need matching non-empty inputs and targets, got {} and {}",
                inputs.len(),
                targets.len()
            )));
        }
        let width = inputs[0].len();
        if inputs.iter().any(|x| x.len() != width) {
            return Err(PipelineError::InvalidParameter(
                "Inputs have mixed lengths".to_string(),
            ));
        }

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        self.weights = vec![0.0; width];
        self.bias = targets.iter().copied().mean();

        let mut order: Vec<usize> = (0..inputs.len()).collect();
        let batch_size = options.batch_size.max(1);

        for epoch in 0..options.epochs {
            order.shuffle(&mut rng);

            for batch in order.chunks(batch_size) {
                let mut grad_w = vec![0.0; width];
                let mut grad_b = 0.0;

                for &i in batch {
                    let error = self.output(&inputs[i]) - targets[i];
                    for (g, x) in grad_w.iter_mut().zip(&inputs[i]) {
                        *g += error * x;
                    }
                    grad_b += error;
                }

                let scale = 2.0 * options.learning_rate / batch.len() as f64;
                for (w, g) in self.weights.iter_mut().zip(&grad_w) {
                    *w -= scale * g;
                }
                self.bias -= scale * grad_b;
            }

            let loss = self.loss(inputs, targets);
            if !loss.is_finite() {
                self.fitted = false;
                return Err(PipelineError::InvalidParameter(format!(
                    "Training diverged at epoch {}; lower the learning rate",
                    epoch + 1
                )));
            }
            log::debug!("epoch {}/{}: loss {:.6}", epoch + 1, options.epochs, loss);
        }

        self.fitted = true;
        Ok(self.loss(inputs, targets))
    }

    fn predict(&self, input: &[f64]) -> Result<f64> {
        if !self.fitted {
            return Err(PipelineError::ModelNotTrained(
                "Linear model has not been fitted".to_string(),
            ));
        }
        if input.len() != self.weights.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "Expected input of length {}, got {}",
                self.weights.len(),
                input.len()
            )));
        }
        Ok(self.output(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(seed: u64) -> FitOptions {
        FitOptions {
            epochs: 200,
            batch_size: 8,
            learning_rate: 0.1,
            seed: Some(seed),
        }
    }

    fn dataset() -> (Vec<Vec<f64>>, Vec<f64>) {
        let inputs: Vec<Vec<f64>> = (0..40)
            .map(|i| {
                let x = i as f64 / 40.0;
                vec![x, 1.0 - x]
            })
            .collect();
        let targets = inputs.iter().map(|x| 0.5 * x[0] + 0.25).collect();
        (inputs, targets)
    }

    #[test]
    fn test_fit_reduces_loss() {
        let (inputs, targets) = dataset();
        let mut model = LinearSequenceModel::new();
        let loss = model.fit(&inputs, &targets, &options(7)).unwrap();

        assert!(loss < 1e-3, "loss {}", loss);
        let prediction = model.predict(&[0.5, 0.5]).unwrap();
        assert!((prediction - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_seeded_fit_is_reproducible() {
        let (inputs, targets) = dataset();
        let mut first = LinearSequenceModel::new();
        let mut second = LinearSequenceModel::new();
        first.fit(&inputs, &targets, &options(11)).unwrap();
        second.fit(&inputs, &targets, &options(11)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LinearSequenceModel::new();
        assert!(matches!(
            model.predict(&[0.0]),
            Err(PipelineError::ModelNotTrained(_))
        ));
    }

    #[test]
    fn test_divergence_is_reported() {
        let (inputs, targets) = dataset();
        let mut model = LinearSequenceModel::new();
        let huge = FitOptions {
            learning_rate: 1e200,
            ..options(1)
        };
        assert!(matches!(
            model.fit(&inputs, &targets, &huge),
            Err(PipelineError::InvalidParameter(_))
        ));
    }
}
