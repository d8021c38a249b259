//! Three-way workflow comparison
//!
//! Runs the baseline heuristic, the forecast-only workflow and the
//! forecast-adjusted optimization in order, timing each one and scoring it
//! from its own output. A failing stage is recorded rather than propagated,
//! so a run always yields a complete [`ComparisonReport`].

use crate::adjust::adjust;
use crate::config::ComparatorConfig;
use crate::data::{trailing, ForecastTarget, TimeSeries};
use crate::error::{PipelineError, Result};
use crate::metrics::{
    evaluate_forecaster, forecast_score, optimization_score, ForecastAccuracy,
};
use crate::models::Forecaster;
use crate::qubo::QuboModel;
use crate::samples::SampleSet;
use crate::solvers::Solver;
use crate::window::WindowBuilder;
use std::fmt;
use std::time::{Duration, Instant};

/// The fixed stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Baseline,
    ForecastOnly,
    ForecastAdjusted,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Baseline, Stage::ForecastOnly, Stage::ForecastAdjusted];

    /// The stage that runs after this one
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Baseline => Some(Stage::ForecastOnly),
            Stage::ForecastOnly => Some(Stage::ForecastAdjusted),
            Stage::ForecastAdjusted => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Baseline => "Baseline",
            Stage::ForecastOnly => "Forecast-only",
            Stage::ForecastAdjusted => "Forecast-adjusted optimization",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageStatus {
    Succeeded,
    Failed { kind: String, message: String },
    Skipped { reason: String },
}

impl StageStatus {
    fn failed(err: &PipelineError) -> Self {
        StageStatus::Failed {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageStatus::Succeeded)
    }

    fn label(&self) -> &str {
        match self {
            StageStatus::Succeeded => "ok",
            StageStatus::Failed { kind, .. } => kind,
            StageStatus::Skipped { .. } => "skipped",
        }
    }
}

/// What a stage produced
#[derive(Debug, Clone, PartialEq)]
pub enum StagePayload {
    None,
    /// Sum of the raw coefficients
    Baseline { coefficient_sum: f64 },
    /// Forecast for the step after the series, with in-sample accuracy
    Forecast {
        value: f64,
        accuracy: ForecastAccuracy,
    },
    /// The model actually solved and the solver's answer
    Optimization {
        adjusted: QuboModel,
        samples: SampleSet,
    },
}

/// Timing, score and payload of one stage
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowRecord {
    pub name: String,
    pub stage: Stage,
    pub status: StageStatus,
    pub elapsed: Duration,
    /// Absent for failed and skipped stages
    pub quality_score: Option<f64>,
    pub payload: StagePayload,
    pub notes: String,
}

impl WorkflowRecord {
    fn skipped(stage: Stage, reason: String, notes: &str) -> Self {
        Self {
            name: stage.name().to_string(),
            stage,
            status: StageStatus::Skipped { reason },
            elapsed: Duration::ZERO,
            quality_score: None,
            payload: StagePayload::None,
            notes: notes.to_string(),
        }
    }

    fn finished(
        stage: Stage,
        started: Instant,
        outcome: Result<(StagePayload, f64)>,
        notes: &str,
    ) -> Self {
        let elapsed = started.elapsed();
        let (status, quality_score, payload) = match outcome {
            Ok((payload, score)) => {
                log::info!(
                    "{} finished in {:.3} ms, score {:.2}",
                    stage,
                    elapsed.as_secs_f64() * 1000.0,
                    score
                );
                (StageStatus::Succeeded, Some(score), payload)
            }
            Err(err) => {
                log::warn!("{} failed: {}", stage, err);
                (StageStatus::failed(&err), None, StagePayload::None)
            }
        };

        Self {
            name: stage.name().to_string(),
            stage,
            status,
            elapsed,
            quality_score,
            payload,
            notes: notes.to_string(),
        }
    }
}

/// Extremes over the records of a report
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComparisonSummary {
    /// Over stages that ran
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
    /// Over stages that produced a score
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

/// Records in execution order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonReport {
    records: Vec<WorkflowRecord>,
}

impl ComparisonReport {
    pub fn records(&self) -> &[WorkflowRecord] {
        &self.records
    }

    pub fn record(&self, stage: Stage) -> Option<&WorkflowRecord> {
        self.records.iter().find(|r| r.stage == stage)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> ComparisonSummary {
        let times: Vec<Duration> = self
            .records
            .iter()
            .filter(|r| !matches!(r.status, StageStatus::Skipped { .. }))
            .map(|r| r.elapsed)
            .collect();
        let scores: Vec<f64> = self.records.iter().filter_map(|r| r.quality_score).collect();

        ComparisonSummary {
            min_time: times.iter().min().copied(),
            max_time: times.iter().max().copied(),
            min_score: scores.iter().copied().reduce(f64::min),
            max_score: scores.iter().copied().reduce(f64::max),
        }
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<32} {:<18} {:>12} {:>8}  {}",
            "Workflow", "Status", "Time (ms)", "Score", "Notes"
        )?;
        writeln!(f, "{}", "-".repeat(100))?;

        for record in &self.records {
            let score = record
                .quality_score
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "{:<32} {:<18} {:>12.3} {:>8}  {}",
                record.name,
                record.status.label(),
                record.elapsed.as_secs_f64() * 1000.0,
                score,
                record.notes
            )?;
        }

        let summary = self.summary();
        if let (Some(min), Some(max)) = (summary.min_time, summary.max_time) {
            writeln!(
                f,
                "Time: {:.3} ms to {:.3} ms",
                min.as_secs_f64() * 1000.0,
                max.as_secs_f64() * 1000.0
            )?;
        }
        if let (Some(min), Some(max)) = (summary.min_score, summary.max_score) {
            writeln!(f, "Score: {:.2} to {:.2}", min, max)?;
        }
        Ok(())
    }
}

/// Runs and compares the three workflows on one series and one QUBO
pub struct WorkflowComparator<F: Forecaster, S: Solver> {
    forecaster: F,
    solver: S,
    windows: WindowBuilder,
    target: ForecastTarget,
    config: ComparatorConfig,
}

impl<F: Forecaster, S: Solver> WorkflowComparator<F, S> {
    pub fn new(
        forecaster: F,
        solver: S,
        window_length: usize,
        config: ComparatorConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            forecaster,
            solver,
            windows: WindowBuilder::new(window_length)?,
            target: ForecastTarget::default(),
            config,
        })
    }

    /// Forecast a derived series such as realized volatility instead of closes
    pub fn with_target(mut self, target: ForecastTarget) -> Self {
        self.target = target;
        self
    }

    pub fn forecaster(&self) -> &F {
        &self.forecaster
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Run every stage and collect the report
    pub fn run(&mut self, series: &TimeSeries, qubo: &QuboModel) -> ComparisonReport {
        let mut records = Vec::with_capacity(Stage::ALL.len());
        let mut forecast = None;
        let mut stage = Some(Stage::Baseline);

        while let Some(current) = stage {
            let record = match current {
                Stage::Baseline => {
                    let started = Instant::now();
                    let outcome = self.run_baseline(qubo);
                    WorkflowRecord::finished(
                        current,
                        started,
                        outcome,
                        "Sum of raw coefficients, fixed score",
                    )
                }
                Stage::ForecastOnly => {
                    let started = Instant::now();
                    let outcome = self.run_forecast(series);
                    if let Ok((StagePayload::Forecast { value, .. }, _)) = &outcome {
                        forecast = Some(*value);
                    }
                    let notes = format!("Forecaster: {}", self.forecaster.name());
                    WorkflowRecord::finished(current, started, outcome, &notes)
                }
                Stage::ForecastAdjusted => {
                    let notes = format!("Solver: {}", self.solver.name());
                    match forecast {
                        Some(factor) => {
                            let started = Instant::now();
                            let outcome = self.run_optimization(qubo, factor);
                            WorkflowRecord::finished(current, started, outcome, &notes)
                        }
                        None => {
                            log::warn!("{} skipped: no forecast available", current);
                            WorkflowRecord::skipped(
                                current,
                                format!("{} did not produce a forecast", Stage::ForecastOnly),
                                &notes,
                            )
                        }
                    }
                }
            };

            records.push(record);
            stage = current.next();
        }

        let report = ComparisonReport { records };
        log::info!("Workflow comparison:\n{}", report);
        report
    }

    fn run_baseline(&self, qubo: &QuboModel) -> Result<(StagePayload, f64)> {
        qubo.validate()?;
        let coefficient_sum = qubo.coefficient_sum();
        log::debug!("Baseline coefficient sum {}", coefficient_sum);
        Ok((
            StagePayload::Baseline { coefficient_sum },
            self.config.baseline_score,
        ))
    }

    fn run_forecast(&mut self, series: &TimeSeries) -> Result<(StagePayload, f64)> {
        let derived = self.target.apply(series)?;
        let windows = self.windows.build_from_slice(&derived)?;
        log::debug!(
            "Training {} on {} windows of length {}",
            self.forecaster.name(),
            windows.len(),
            self.windows.window_length()
        );

        self.forecaster.train(&windows)?;
        let latest = trailing(&derived, self.windows.window_length())?;
        let value = self.forecaster.predict(latest)?;
        if !value.is_finite() {
            return Err(PipelineError::InvalidParameter(format!(
                "{} produced a non-finite forecast",
                self.forecaster.name()
            )));
        }

        let accuracy =
            evaluate_forecaster(&self.forecaster, &windows, self.config.evaluation_windows)?;
        log::debug!("Forecast {} ({})", value, accuracy);

        Ok((
            StagePayload::Forecast { value, accuracy },
            forecast_score(&accuracy),
        ))
    }

    fn run_optimization(&self, qubo: &QuboModel, factor: f64) -> Result<(StagePayload, f64)> {
        let adjusted = adjust(qubo, factor);
        let samples = self.solver.solve(&adjusted)?;
        let score = optimization_score(&adjusted, &samples);
        log::debug!(
            "Solver {} returned {} samples, best energy {:?}",
            self.solver.name(),
            samples.len(),
            samples.best().map(|s| s.energy)
        );

        Ok((StagePayload::Optimization { adjusted, samples }, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConstantForecaster;
    use crate::solvers::MockSolver;

    fn model() -> QuboModel {
        QuboModel::new([((1, 1), -0.1), ((1, 2), 0.05), ((2, 2), -0.2)]).unwrap()
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(Stage::Baseline.next(), Some(Stage::ForecastOnly));
        assert_eq!(Stage::ForecastOnly.next(), Some(Stage::ForecastAdjusted));
        assert_eq!(Stage::ForecastAdjusted.next(), None);
    }

    #[test]
    fn test_short_series_skips_optimization() {
        let series = TimeSeries::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        let mut comparator = WorkflowComparator::new(
            ConstantForecaster::new(1.5),
            MockSolver::default(),
            10,
            ComparatorConfig::default(),
        )
        .unwrap();

        let report = comparator.run(&series, &model());
        assert_eq!(report.len(), 3);
        assert!(report.record(Stage::Baseline).unwrap().status.is_success());
        assert!(matches!(
            &report.record(Stage::ForecastOnly).unwrap().status,
            StageStatus::Failed { kind, .. } if kind == "InsufficientData"
        ));
        let skipped = report.record(Stage::ForecastAdjusted).unwrap();
        assert!(matches!(skipped.status, StageStatus::Skipped { .. }));
        assert_eq!(skipped.quality_score, None);
    }

    #[test]
    fn test_summary_ignores_missing_scores() {
        let series = TimeSeries::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        let mut comparator = WorkflowComparator::new(
            ConstantForecaster::new(1.5),
            MockSolver::default(),
            10,
            ComparatorConfig::default(),
        )
        .unwrap();

        let summary = comparator.run(&series, &model()).summary();
        assert_eq!(summary.min_score, Some(60.0));
        assert_eq!(summary.max_score, Some(60.0));
        assert!(summary.min_time.is_some());
    }
}
