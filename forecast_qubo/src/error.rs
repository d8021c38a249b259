//! Error types for the forecast_qubo crate

use thiserror::Error;

/// Custom error types for the forecast_qubo crate
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The series is too short for the requested window length
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// `predict` was called before `train`
    #[error("Model not trained: {0}")]
    ModelNotTrained(String),

    /// Malformed coefficient mapping, malformed key or non-finite value
    #[error("Invalid QUBO: {0}")]
    InvalidQubo(String),

    /// An assignment does not cover every variable of the model
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// The solver backend could not be reached or failed during solve
    #[error("Solver unavailable: {0}")]
    SolverUnavailable(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error in the pipeline configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error raised by the market data feed
    #[error("Data error: {0}")]
    Data(#[from] market_data::FeedError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from JSON encoding or decoding
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Stable name of the error variant, recorded in workflow reports
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InsufficientData(_) => "InsufficientData",
            PipelineError::ModelNotTrained(_) => "ModelNotTrained",
            PipelineError::InvalidQubo(_) => "InvalidQubo",
            PipelineError::UnknownVariable(_) => "UnknownVariable",
            PipelineError::SolverUnavailable(_) => "SolverUnavailable",
            PipelineError::InvalidParameter(_) => "InvalidParameter",
            PipelineError::Config(_) => "Config",
            PipelineError::Data(_) => "Data",
            PipelineError::Io(_) => "Io",
            PipelineError::Serialization(_) => "Serialization",
        }
    }
}

impl From<trade_math::MathError> for PipelineError {
    fn from(err: trade_math::MathError) -> Self {
        match err {
            trade_math::MathError::InsufficientData(msg) => PipelineError::InsufficientData(msg),
            other => PipelineError::InvalidParameter(other.to_string()),
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, PipelineError>;
