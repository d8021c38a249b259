//! Pipeline configuration
//!
//! Every component receives its settings explicitly; there is no process-wide
//! state. The mock/live toggles can be overridden from the environment with
//! `USE_MOCK_DATA` and `USE_MOCK_SOLVER`.

use crate::data::ForecastTarget;
use crate::models::Smoothing;
use crate::error::{PipelineError, Result};
use crate::solvers::{RetryPolicy, SimulatedAnnealingConfig};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding [`DataConfig::use_mock_data`]
pub const USE_MOCK_DATA_ENV: &str = "USE_MOCK_DATA";
/// Environment variable overriding [`SolverConfig::use_mock_solver`]
pub const USE_MOCK_SOLVER_ENV: &str = "USE_MOCK_SOLVER";

/// 2024-12-30 09:30:00 UTC
const DEFAULT_START_SECS: i64 = 1_735_551_000;
/// 2024-12-30 16:00:00 UTC
const DEFAULT_END_SECS: i64 = 1_735_574_400;

/// Parse a boolean toggle such as `1`, `true`, `no` or `OFF`
pub fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PipelineError::Config(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

/// Which forecaster implementation to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForecasterKind {
    /// Trainable sequence regressor behind the window adapter
    #[default]
    Sequence,
    /// Window mean plus a learned bias
    MovingAverage,
}

/// Forecaster adapter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecasterConfig {
    pub kind: ForecasterKind,
    /// Level used by the moving average forecaster
    pub smoothing: Smoothing,
    pub window_length: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub validation_split: f64,
    pub learning_rate: f64,
    /// Fixed seed for reproducible training
    pub seed: Option<u64>,
    pub target: ForecastTarget,
}

impl Default for ForecasterConfig {
    fn default() -> Self {
        Self {
            kind: ForecasterKind::default(),
            smoothing: Smoothing::default(),
            window_length: 10,
            epochs: 5,
            batch_size: 32,
            validation_split: 0.2,
            learning_rate: 0.05,
            seed: None,
            target: ForecastTarget::default(),
        }
    }
}

impl ForecasterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_length < 1 {
            return Err(PipelineError::Config(
                "window_length must be at least 1".to_string(),
            ));
        }
        if self.epochs < 1 {
            return Err(PipelineError::Config(
                "epochs must be at least 1".to_string(),
            ));
        }
        if self.batch_size < 1 {
            return Err(PipelineError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(PipelineError::Config(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(PipelineError::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        match self.target {
            ForecastTarget::RealizedVolatility { window } if window == 0 => Err(
                PipelineError::Config("volatility window must be at least 1".to_string()),
            ),
            ForecastTarget::EwmaVolatility { lambda } if !(0.0..1.0).contains(&lambda) => {
                Err(PipelineError::Config(format!(
                    "EWMA lambda must be in [0, 1), got {}",
                    lambda
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Parameters of the synthetic market data generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub base_price: f64,
    pub volatility: f64,
    pub trend: f64,
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            base_price: 100.0,
            volatility: 0.001,
            trend: 0.0,
            seed: None,
        }
    }
}

/// Market data settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Generate synthetic bars instead of reading the CSV feed
    pub use_mock_data: bool,
    pub symbol: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Bar file for the live path
    pub csv_path: Option<PathBuf>,
    pub synthetic: SyntheticConfig,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            use_mock_data: true,
            symbol: "AAPL US Equity".to_string(),
            start: Utc.timestamp_opt(DEFAULT_START_SECS, 0).single().unwrap_or_default(),
            end: Utc.timestamp_opt(DEFAULT_END_SECS, 0).single().unwrap_or_default(),
            csv_path: None,
            synthetic: SyntheticConfig::default(),
        }
    }
}

impl DataConfig {
    pub fn validate(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(PipelineError::Config(format!(
                "start ({}) must be before end ({})",
                self.start.to_rfc3339(),
                self.end.to_rfc3339()
            )));
        }
        if !self.use_mock_data && self.csv_path.is_none() {
            return Err(PipelineError::Config(
                "csv_path is required when use_mock_data is false".to_string(),
            ));
        }
        Ok(())
    }
}

/// Solver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Use the fixed-answer solver instead of the annealing backend
    pub use_mock_solver: bool,
    pub retry: RetryPolicy,
    pub annealing: SimulatedAnnealingConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            use_mock_solver: true,
            retry: RetryPolicy::default(),
            annealing: SimulatedAnnealingConfig::default(),
        }
    }
}

/// Workflow comparison settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorConfig {
    /// Fixed quality score of the baseline heuristic
    pub baseline_score: f64,
    /// Trailing training windows used to score the forecast stage
    pub evaluation_windows: usize,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            baseline_score: 60.0,
            evaluation_windows: 10,
        }
    }
}

impl ComparatorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.baseline_score.is_finite() {
            return Err(PipelineError::Config(
                "baseline_score must be finite".to_string(),
            ));
        }
        if self.evaluation_windows == 0 {
            return Err(PipelineError::Config(
                "evaluation_windows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete configuration of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub data: DataConfig,
    pub forecaster: ForecasterConfig,
    pub solver: SolverConfig,
    pub comparator: ComparatorConfig,
}

impl PipelineConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Apply `USE_MOCK_DATA` / `USE_MOCK_SOLVER` from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply toggle overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(USE_MOCK_DATA_ENV) {
            self.data.use_mock_data = parse_flag(USE_MOCK_DATA_ENV, &value)?;
        }
        if let Some(value) = lookup(USE_MOCK_SOLVER_ENV) {
            self.solver.use_mock_solver = parse_flag(USE_MOCK_SOLVER_ENV, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.data.validate()?;
        self.forecaster.validate()?;
        self.comparator.validate()
    }
}
