//! # QUBO Workflow
//!
//! `qubo_workflow` bundles the workspace crates behind one dependency:
//!
//! - [`forecast_qubo`]: windowing, forecasters, QUBO models, solvers and the
//!   workflow comparison
//! - [`market_data`]: OHLCV bars and the synthetic and CSV feeds
//! - [`trade_math`]: moving averages, volatility and scaling helpers
//!
//! ## Example
//!
//! ```
//! use qubo_workflow::forecast_qubo::models::ConstantForecaster;
//! use qubo_workflow::forecast_qubo::solvers::MockSolver;
//! use qubo_workflow::forecast_qubo::workflow::WorkflowComparator;
//! use qubo_workflow::forecast_qubo::{QuboModel, TimeSeries};
//! use qubo_workflow::forecast_qubo::config::ComparatorConfig;
//!
//! let series = TimeSeries::from_values((0..50).map(|i| (i as f64).sin()).collect())?;
//! let qubo = QuboModel::new([((1, 1), -0.1), ((1, 2), 0.05), ((2, 2), -0.2)])?;
//!
//! let mut comparator = WorkflowComparator::new(
//!     ConstantForecaster::new(1.5),
//!     MockSolver::default(),
//!     10,
//!     ComparatorConfig::default(),
//! )?;
//! let report = comparator.run(&series, &qubo);
//! assert_eq!(report.len(), 3);
//! # Ok::<(), qubo_workflow::forecast_qubo::PipelineError>(())
//! ```

pub use forecast_qubo;
pub use market_data;
pub use trade_math;
