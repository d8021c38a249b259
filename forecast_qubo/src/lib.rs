//! # Forecast QUBO
//!
//! A forecast-adjusted QUBO pipeline: market data is windowed, a forecaster
//! predicts the next value, and that prediction rescales a QUBO before it is
//! handed to a solver.
//!
//! ## Features
//!
//! - Time series and fixed-length training windows
//! - Forecasters behind one trait (sequence regressor adapter, moving average, constant stub)
//! - Validated QUBO models with JSON interchange
//! - Solvers behind one trait (fixed-answer mock, annealing backends with scoped sessions)
//! - A timed, scored comparison of the baseline, forecast-only and
//!   forecast-adjusted workflows
//!
//! ## Quick Start
//!
//! ```rust
//! use forecast_qubo::qubo::{Assignment, QuboModel};
//! use forecast_qubo::solvers::{MockSolver, Solver};
//! use forecast_qubo::adjust;
//!
//! let model = QuboModel::new([((1, 1), -0.1), ((1, 2), 0.05), ((2, 2), -0.2)])?;
//! let both = Assignment::from_iter([(1, true), (2, true)]);
//! assert!((model.energy(&both)? + 0.25).abs() < 1e-12);
//!
//! let adjusted = adjust(&model, 2.0);
//! let samples = MockSolver::default().solve(&adjusted)?;
//! assert_eq!(samples.len(), 4);
//! # Ok::<(), forecast_qubo::PipelineError>(())
//! ```

pub mod adjust;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod qubo;
pub mod samples;
pub mod solvers;
pub mod window;
pub mod workflow;

pub use adjust::adjust;
pub use config::PipelineConfig;
pub use data::{ForecastTarget, TimeSeries};
pub use error::{PipelineError, Result};
pub use models::Forecaster;
pub use qubo::{Assignment, QuboModel, Variable};
pub use samples::{SampleResult, SampleSet};
pub use solvers::Solver;
pub use window::{TrainingWindow, WindowBuilder};
pub use workflow::{ComparisonReport, Stage, StageStatus, WorkflowComparator};
