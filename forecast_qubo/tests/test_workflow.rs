use chrono::{Duration, TimeZone, Utc};
use forecast_qubo::config::{ComparatorConfig, ForecasterKind, PipelineConfig};
use forecast_qubo::models::{ConstantForecaster, Forecaster, MovingAverageForecaster};
use forecast_qubo::pipeline::run_pipeline;
use forecast_qubo::solvers::{MockSolver, Solver};
use forecast_qubo::data::ForecastTarget;
use forecast_qubo::window::{TrainingWindow, WindowBuilder};
use forecast_qubo::workflow::{Stage, StagePayload, StageStatus, WorkflowComparator};
use forecast_qubo::{PipelineError, QuboModel, Result, SampleSet, TimeSeries};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn example() -> QuboModel {
    QuboModel::new([((1, 1), -0.1), ((1, 2), 0.05), ((2, 2), -0.2)]).unwrap()
}

fn sine(n: usize) -> TimeSeries {
    TimeSeries::from_values((0..n).map(|i| (i as f64 * 0.2).sin()).collect()).unwrap()
}

/// Trains successfully but cannot predict
struct BrokenForecaster;

impl Forecaster for BrokenForecaster {
    fn name(&self) -> &str {
        "broken"
    }

    fn train(&mut self, _windows: &[TrainingWindow]) -> Result<()> {
        Ok(())
    }

    fn predict(&self, _latest_window: &[f64]) -> Result<f64> {
        Err(PipelineError::ModelNotTrained("always".to_string()))
    }

    fn is_trained(&self) -> bool {
        false
    }
}

/// Always unreachable
struct OfflineSolver;

impl Solver for OfflineSolver {
    fn name(&self) -> &str {
        "offline"
    }

    fn solve(&self, _model: &QuboModel) -> Result<SampleSet> {
        Err(PipelineError::SolverUnavailable("offline: no route".to_string()))
    }
}

#[test]
fn test_end_to_end_with_stub_forecaster() {
    let mut comparator = WorkflowComparator::new(
        ConstantForecaster::new(1.5),
        MockSolver::default(),
        10,
        ComparatorConfig::default(),
    )
    .unwrap();

    let report = comparator.run(&sine(100), &example());
    assert_eq!(report.len(), 3);
    let stages: Vec<Stage> = report.records().iter().map(|r| r.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());
    assert!(report.records().iter().all(|r| r.status.is_success()));

    let baseline = report.record(Stage::Baseline).unwrap();
    assert_eq!(baseline.quality_score, Some(60.0));
    match &baseline.payload {
        StagePayload::Baseline { coefficient_sum } => {
            assert!((coefficient_sum + 0.25).abs() < 1e-12)
        }
        other => panic!("unexpected payload {:?}", other),
    }

    match &report.record(Stage::ForecastOnly).unwrap().payload {
        StagePayload::Forecast { value, .. } => assert_eq!(*value, 1.5),
        other => panic!("unexpected payload {:?}", other),
    }

    let optimization = report.record(Stage::ForecastAdjusted).unwrap();
    match &optimization.payload {
        StagePayload::Optimization { adjusted, samples } => {
            let expected =
                QuboModel::new([((1, 1), -0.15), ((1, 2), 0.075), ((2, 2), -0.3)]).unwrap();
            assert!(adjusted.approx_eq(&expected, 1e-12));
            assert_eq!(samples, MockSolver::default().fixed_samples());
        }
        other => panic!("unexpected payload {:?}", other),
    }

    let score = optimization.quality_score.unwrap();
    assert!((0.0..=100.0).contains(&score));
}

#[test]
fn test_forecast_failure_skips_optimization() {
    let mut comparator = WorkflowComparator::new(
        BrokenForecaster,
        MockSolver::default(),
        10,
        ComparatorConfig::default(),
    )
    .unwrap();

    let report = comparator.run(&sine(50), &example());
    assert_eq!(report.len(), 3);

    let forecast = report.record(Stage::ForecastOnly).unwrap();
    assert_eq!(
        forecast.status,
        StageStatus::Failed {
            kind: "ModelNotTrained".to_string(),
            message: "Model not trained: always".to_string(),
        }
    );
    assert_eq!(forecast.quality_score, None);

    let optimization = report.record(Stage::ForecastAdjusted).unwrap();
    assert!(matches!(optimization.status, StageStatus::Skipped { .. }));
    assert_eq!(optimization.payload, StagePayload::None);
}

#[test]
fn test_solver_failure_is_recorded() {
    let mut comparator = WorkflowComparator::new(
        MovingAverageForecaster::default(),
        OfflineSolver,
        5,
        ComparatorConfig::default(),
    )
    .unwrap();

    let report = comparator.run(&sine(40), &example());
    assert!(report.record(Stage::ForecastOnly).unwrap().status.is_success());
    assert!(matches!(
        &report.record(Stage::ForecastAdjusted).unwrap().status,
        StageStatus::Failed { kind, .. } if kind == "SolverUnavailable"
    ));
}

#[test]
fn test_report_table_lists_every_stage() {
    let mut comparator = WorkflowComparator::new(
        ConstantForecaster::new(1.0),
        MockSolver::default(),
        10,
        ComparatorConfig {
            baseline_score: 42.0,
            ..ComparatorConfig::default()
        },
    )
    .unwrap();

    let report = comparator.run(&sine(30), &example());
    let table = report.to_string();
    for stage in Stage::ALL {
        assert!(table.contains(stage.name()), "{}", table);
    }
    assert!(table.contains("42.00"));

    let summary = report.summary();
    assert!(summary.min_time <= summary.max_time);
    assert!(summary.min_score.unwrap() <= summary.max_score.unwrap());
}

#[test]
fn test_forecast_score_reflects_accuracy() {
    // A constant series is predicted exactly by the constant stub
    let series = TimeSeries::from_values(vec![2.0; 30]).unwrap();
    let mut comparator = WorkflowComparator::new(
        ConstantForecaster::new(2.0),
        MockSolver::default(),
        5,
        ComparatorConfig::default(),
    )
    .unwrap();

    let report = comparator.run(&series, &example());
    let score = report.record(Stage::ForecastOnly).unwrap().quality_score.unwrap();
    assert!((score - 100.0).abs() < 1e-12);
}

#[test]
fn test_comparator_rejects_invalid_config() {
    let no_windows = WorkflowComparator::new(
        ConstantForecaster::new(1.0),
        MockSolver::default(),
        10,
        ComparatorConfig {
            evaluation_windows: 0,
            ..ComparatorConfig::default()
        },
    );
    assert!(matches!(no_windows, Err(PipelineError::Config(_))));

    let nan_baseline = WorkflowComparator::new(
        ConstantForecaster::new(1.0),
        MockSolver::default(),
        10,
        ComparatorConfig {
            baseline_score: f64::NAN,
            ..ComparatorConfig::default()
        },
    );
    assert!(matches!(nan_baseline, Err(PipelineError::Config(_))));
}

#[test]
fn test_volatility_target_predicts_from_latest_derived_window() {
    let series = TimeSeries::from_values(
        (0..80)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * (1.0 + i as f64 / 40.0))
            .collect(),
    )
    .unwrap();
    let target = ForecastTarget::RealizedVolatility { window: 5 };

    let mut comparator = WorkflowComparator::new(
        MovingAverageForecaster::default(),
        MockSolver::default(),
        6,
        ComparatorConfig::default(),
    )
    .unwrap()
    .with_target(target);
    let report = comparator.run(&series, &example());

    let derived = target.apply(&series).unwrap();
    let windows = WindowBuilder::new(6).unwrap().build_from_slice(&derived).unwrap();
    let mut reference = MovingAverageForecaster::default();
    reference.train(&windows).unwrap();
    let expected = reference.predict(&derived[derived.len() - 6..]).unwrap();

    match &report.record(Stage::ForecastOnly).unwrap().payload {
        StagePayload::Forecast { value, .. } => assert!((value - expected).abs() < 1e-12),
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_pipeline_with_mock_components() {
    let mut config = PipelineConfig::default();
    config.data.synthetic.seed = Some(7);
    config.forecaster.seed = Some(7);

    let report = run_pipeline(&config, &example()).unwrap();
    assert_eq!(report.len(), 3);
    assert!(report.records().iter().all(|r| r.status.is_success()));
}

#[test]
fn test_pipeline_with_annealing_and_moving_average() {
    let mut config = PipelineConfig::default();
    config.data.synthetic.seed = Some(11);
    config.forecaster.kind = ForecasterKind::MovingAverage;
    config.solver.use_mock_solver = false;
    config.solver.annealing.seed = Some(11);

    let report = run_pipeline(&config, &example()).unwrap();
    let optimization = report.record(Stage::ForecastAdjusted).unwrap();
    assert!(optimization.status.is_success(), "{:?}", optimization.status);
    match &optimization.payload {
        StagePayload::Optimization { samples, .. } => assert!(!samples.is_empty()),
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_pipeline_from_csv_feed() {
    let start = Utc.with_ymd_and_hms(2024, 12, 30, 9, 30, 0).unwrap();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
    for i in 0..60 {
        let close = 100.0 + (i as f64 * 0.3).sin();
        writeln!(
            file,
            "{},{},{},{},{},1000",
            (start + Duration::minutes(i)).to_rfc3339(),
            close,
            close + 0.1,
            close - 0.1,
            close
        )
        .unwrap();
    }

    let mut config = PipelineConfig::default();
    config.data.use_mock_data = false;
    config.data.csv_path = Some(file.path().to_path_buf());
    config.data.start = start;
    config.data.end = start + Duration::minutes(60);
    config.forecaster.seed = Some(1);

    let report = run_pipeline(&config, &example()).unwrap();
    assert!(report.records().iter().all(|r| r.status.is_success()));
}

#[test]
fn test_pipeline_rejects_missing_csv_path() {
    let mut config = PipelineConfig::default();
    config.data.use_mock_data = false;

    assert!(matches!(
        run_pipeline(&config, &example()),
        Err(PipelineError::Config(_))
    ));
}
