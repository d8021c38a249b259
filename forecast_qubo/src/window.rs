//! Fixed-length training windows
//!
//! A series of length `N` and window length `W` yields `N - W` windows; window
//! `k` has features `series[k..k + W]` and target `series[k + W]`.

use crate::data::TimeSeries;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// One `(features, target)` training pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingWindow {
    features: Vec<f64>,
    target: f64,
}

impl TrainingWindow {
    /// The `W` consecutive observations preceding the target
    pub fn features(&self) -> &[f64] {
        &self.features
    }

    /// The observation immediately after the features
    pub fn target(&self) -> f64 {
        self.target
    }
}

/// Slices series into training windows of a fixed length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBuilder {
    window_length: usize,
}

impl WindowBuilder {
    /// Create a builder; the window length must be at least 1
    pub fn new(window_length: usize) -> Result<Self> {
        if window_length == 0 {
            return Err(PipelineError::InvalidParameter(
                "Window length must be at least 1".to_string(),
            ));
        }
        Ok(Self { window_length })
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    /// Build the windows of a time series, earliest first
    pub fn build(&self, series: &TimeSeries) -> Result<Vec<TrainingWindow>> {
        self.build_from_slice(series.values())
    }

    /// Build the windows of a raw slice, earliest first
    pub fn build_from_slice(&self, values: &[f64]) -> Result<Vec<TrainingWindow>> {
        let w = self.window_length;
        if values.len() <= w {
            return Err(PipelineError::InsufficientData(format!(
                "Series of length {} is too short for window length {}",
                values.len(),
                w
            )));
        }

        Ok(values
            .windows(w + 1)
            .map(|chunk| TrainingWindow {
                features: chunk[..w].to_vec(),
                target: chunk[w],
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_window_rejected() {
        assert!(matches!(
            WindowBuilder::new(0),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_single_window() {
        let windows = WindowBuilder::new(2)
            .unwrap()
            .build_from_slice(&[1.0, 2.0, 3.0])
            .unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].features(), &[1.0, 2.0]);
        assert_eq!(windows[0].target(), 3.0);
    }
}
