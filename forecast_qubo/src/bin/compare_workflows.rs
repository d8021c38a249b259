//! Compare the baseline, forecast-only and forecast-adjusted workflows
//!
//! ```text
//! compare_workflows --symbol "AAPL US Equity" --mock-data true --mock-solver false \
//!     --seed 7 --samples-out out/samples.json
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use forecast_qubo::pipeline::run_pipeline;
use forecast_qubo::workflow::{Stage, StagePayload};
use forecast_qubo::{PipelineConfig, QuboModel};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compare forecast-adjusted QUBO workflows")]
struct Cli {
    /// JSON pipeline configuration; missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Instrument to fetch
    #[arg(long)]
    symbol: Option<String>,

    /// Start of the data range (RFC 3339, inclusive)
    #[arg(long)]
    start: Option<DateTime<Utc>>,

    /// End of the data range (RFC 3339, exclusive)
    #[arg(long)]
    end: Option<DateTime<Utc>>,

    /// QUBO in `[[[i, j], value], ...]` form; a two-position example is used otherwise
    #[arg(long)]
    qubo: Option<PathBuf>,

    /// Use synthetic market data
    #[arg(long, value_name = "BOOL")]
    mock_data: Option<bool>,

    /// Use the fixed-answer solver
    #[arg(long, value_name = "BOOL")]
    mock_solver: Option<bool>,

    /// Seed for data generation, training and annealing
    #[arg(long)]
    seed: Option<u64>,

    /// Write the optimization samples to this file
    #[arg(long)]
    samples_out: Option<PathBuf>,
}

fn example_qubo() -> forecast_qubo::Result<QuboModel> {
    QuboModel::new([
        (("Position_1", "Position_1"), -0.1),
        (("Position_1", "Position_2"), 0.05),
        (("Position_2", "Position_2"), -0.2),
    ])
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config.apply_env_overrides()?;

    if let Some(symbol) = &cli.symbol {
        config.data.symbol = symbol.clone();
    }
    if let Some(start) = cli.start {
        config.data.start = start;
    }
    if let Some(end) = cli.end {
        config.data.end = end;
    }
    if let Some(mock_data) = cli.mock_data {
        config.data.use_mock_data = mock_data;
    }
    if let Some(mock_solver) = cli.mock_solver {
        config.solver.use_mock_solver = mock_solver;
    }
    if let Some(seed) = cli.seed {
        config.data.synthetic.seed = Some(seed);
        config.forecaster.seed = Some(seed);
        config.solver.annealing.seed = Some(seed);
    }

    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let qubo = match &cli.qubo {
        Some(path) => QuboModel::load_json(path)
            .with_context(|| format!("loading QUBO {}", path.display()))?,
        None => example_qubo()?,
    };

    log::info!(
        "Running {} from {} to {} (mock data: {}, mock solver: {})",
        config.data.symbol,
        config.data.start.to_rfc3339(),
        config.data.end.to_rfc3339(),
        config.data.use_mock_data,
        config.solver.use_mock_solver
    );

    let report = run_pipeline(&config, &qubo)?;
    println!("{}", report);

    if let Some(path) = &cli.samples_out {
        match report.record(Stage::ForecastAdjusted).map(|r| &r.payload) {
            Some(StagePayload::Optimization { samples, .. }) => {
                samples
                    .save_json(path)
                    .with_context(|| format!("writing samples to {}", path.display()))?;
                log::info!("Wrote {} samples to {}", samples.len(), path.display());
            }
            _ => log::warn!("No optimization samples to write"),
        }
    }

    Ok(())
}
