use forecast_qubo::config::{
    parse_flag, ForecasterKind, PipelineConfig, USE_MOCK_DATA_ENV, USE_MOCK_SOLVER_ENV,
};
use forecast_qubo::data::ForecastTarget;
use forecast_qubo::models::Smoothing;
use forecast_qubo::pipeline::{build_forecaster, build_solver};
use forecast_qubo::PipelineError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = PipelineConfig::default();

    assert!(config.data.use_mock_data);
    assert!(config.solver.use_mock_solver);
    assert_eq!(config.data.symbol, "AAPL US Equity");
    assert_eq!(config.data.start.to_rfc3339(), "2024-12-30T09:30:00+00:00");
    assert_eq!(config.data.end.to_rfc3339(), "2024-12-30T16:00:00+00:00");
    assert_eq!(config.forecaster.window_length, 10);
    assert_eq!(config.forecaster.epochs, 5);
    assert_eq!(config.forecaster.batch_size, 32);
    assert_eq!(config.forecaster.validation_split, 0.2);
    assert_eq!(config.comparator.baseline_score, 60.0);
    assert!(config.validate().is_ok());
}

#[rstest]
#[case("1", true)]
#[case("true", true)]
#[case("YES", true)]
#[case(" on ", true)]
#[case("0", false)]
#[case("False", false)]
#[case("no", false)]
#[case("off", false)]
fn test_parse_flag(#[case] raw: &str, #[case] expected: bool) {
    assert_eq!(parse_flag("FLAG", raw).unwrap(), expected);
}

#[test]
fn test_parse_flag_rejects_garbage() {
    assert!(matches!(
        parse_flag("FLAG", "maybe"),
        Err(PipelineError::Config(_))
    ));
}

#[test]
fn test_overrides_from_lookup() {
    let vars: HashMap<&str, &str> =
        HashMap::from([(USE_MOCK_DATA_ENV, "false"), (USE_MOCK_SOLVER_ENV, "0")]);

    let mut config = PipelineConfig::default();
    config
        .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
        .unwrap();

    assert!(!config.data.use_mock_data);
    assert!(!config.solver.use_mock_solver);
}

#[test]
fn test_missing_overrides_keep_config() {
    let mut config = PipelineConfig::default();
    config.apply_overrides(|_| None).unwrap();
    assert_eq!(config, PipelineConfig::default());
}

#[test]
fn test_partial_json_uses_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "forecaster": {{ "window_length": 20, "kind": "moving_average",
                             "smoothing": "exponential",
                             "target": {{ "kind": "realized_volatility", "window": 15 }} }},
            "solver": {{ "use_mock_solver": false, "retry": {{ "max_attempts": 3 }} }}
        }}"#
    )
    .unwrap();

    let config = PipelineConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.forecaster.window_length, 20);
    assert_eq!(config.forecaster.kind, ForecasterKind::MovingAverage);
    assert_eq!(config.forecaster.smoothing, Smoothing::Exponential);
    assert_eq!(
        config.forecaster.target,
        ForecastTarget::RealizedVolatility { window: 15 }
    );
    assert_eq!(config.forecaster.epochs, 5);
    assert!(!config.solver.use_mock_solver);
    assert_eq!(config.solver.retry.max_attempts, 3);
    assert_eq!(config.solver.retry.backoff_ms, 0);
    assert!(config.data.use_mock_data);
}

#[rstest]
#[case(r#"{"forecaster": {"window_length": 0}}"#)]
#[case(r#"{"forecaster": {"validation_split": 1.0}}"#)]
#[case(r#"{"data": {"start": "2024-12-30T16:00:00Z", "end": "2024-12-30T09:30:00Z"}}"#)]
#[case(r#"{"data": {"use_mock_data": false}}"#)]
#[case(r#"{"comparator": {"evaluation_windows": 0}}"#)]
fn test_invalid_configs(#[case] json: &str) {
    let config = PipelineConfig::from_json(json).unwrap();
    assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
}

#[test]
fn test_malformed_json() {
    assert!(matches!(
        PipelineConfig::from_json("{ not json"),
        Err(PipelineError::Serialization(_))
    ));
}

#[test]
fn test_variant_selection() {
    let mut config = PipelineConfig::default();
    assert_eq!(build_solver(&config.solver).name(), "mock");

    config.solver.use_mock_solver = false;
    assert_eq!(build_solver(&config.solver).name(), "simulated-annealing");

    let forecaster = build_forecaster(&config.forecaster).unwrap();
    assert!(!forecaster.is_trained());
    assert!(matches!(
        forecaster.predict(&[1.0; 10]),
        Err(PipelineError::ModelNotTrained(_))
    ));
}

#[test]
fn test_moving_average_smoothing_selected_from_config() {
    let mut config = PipelineConfig::default();
    config.forecaster.kind = ForecasterKind::MovingAverage;
    assert_eq!(
        build_forecaster(&config.forecaster).unwrap().name(),
        "Simple Moving Average"
    );

    config.forecaster.smoothing = Smoothing::Exponential;
    assert_eq!(
        build_forecaster(&config.forecaster).unwrap().name(),
        "Exponential Moving Average"
    );
}
