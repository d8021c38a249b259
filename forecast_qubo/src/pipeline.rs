//! Assembly of a pipeline run from its configuration
//!
//! Variant selection happens here and nowhere else: the mock/live toggles pick
//! the feed and the solver, the forecaster kind picks the model.

use crate::config::{DataConfig, ForecasterConfig, ForecasterKind, PipelineConfig, SolverConfig};
use crate::data::TimeSeries;
use crate::error::{PipelineError, Result};
use crate::models::{
    Forecaster, LinearSequenceModel, MovingAverageForecaster, SequenceForecaster,
};
use crate::qubo::QuboModel;
use crate::solvers::{AnnealingSolver, MockSolver, SimulatedAnnealingBackend, Solver};
use crate::workflow::{ComparisonReport, WorkflowComparator};
use market_data::{CsvFeed, MarketDataFeed, SyntheticFeed};

/// Synthetic bars when `use_mock_data` is set, the CSV feed otherwise
pub fn build_feed(config: &DataConfig) -> Result<Box<dyn MarketDataFeed>> {
    if config.use_mock_data {
        let params = &config.synthetic;
        let mut feed =
            SyntheticFeed::new(params.base_price, params.volatility).with_trend(params.trend);
        if let Some(seed) = params.seed {
            feed = feed.with_seed(seed);
        }
        return Ok(Box::new(feed));
    }

    let path = config.csv_path.as_ref().ok_or_else(|| {
        PipelineError::Config("csv_path is required when use_mock_data is false".to_string())
    })?;
    Ok(Box::new(CsvFeed::new(path)))
}

pub fn build_forecaster(config: &ForecasterConfig) -> Result<Box<dyn Forecaster>> {
    let forecaster: Box<dyn Forecaster> = match config.kind {
        ForecasterKind::Sequence => Box::new(SequenceForecaster::from_config(
            "Linear sequence model",
            LinearSequenceModel::new(),
            config,
        )?),
        ForecasterKind::MovingAverage => Box::new(MovingAverageForecaster::new(config.smoothing)),
    };
    Ok(forecaster)
}

/// The fixed-answer solver when `use_mock_solver` is set, local annealing otherwise
pub fn build_solver(config: &SolverConfig) -> Box<dyn Solver> {
    if config.use_mock_solver {
        Box::new(MockSolver::default())
    } else {
        Box::new(
            AnnealingSolver::new(SimulatedAnnealingBackend::new(config.annealing))
                .with_retry(config.retry),
        )
    }
}

/// Fetch the configured symbol and range as a close-price series
pub fn load_series(config: &DataConfig) -> Result<TimeSeries> {
    let feed = build_feed(config)?;
    let bars = feed.fetch(&config.symbol, config.start, config.end)?;
    log::info!(
        "Fetched {} bars of {} from {} feed",
        bars.len(),
        config.symbol,
        feed.name()
    );
    TimeSeries::from_bars(&bars)
}

/// Load data, build the components and compare the three workflows
pub fn run_pipeline(config: &PipelineConfig, qubo: &QuboModel) -> Result<ComparisonReport> {
    config.validate()?;
    qubo.validate()?;

    let series = load_series(&config.data)?;
    let forecaster = build_forecaster(&config.forecaster)?;
    let solver = build_solver(&config.solver);

    let mut comparator = WorkflowComparator::new(
        forecaster,
        solver,
        config.forecaster.window_length,
        config.comparator.clone(),
    )?
    .with_target(config.forecaster.target);

    Ok(comparator.run(&series, qubo))
}
