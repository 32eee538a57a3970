//! Resource Forecasting
//!
//! Drives the autoregressive multi-step rollout for each hospital resource,
//! isolates per-resource failures, and assembles the shared forecast table.

mod evaluation;
mod export;
mod pipeline;
mod rollout;
mod series;
mod summary;

pub use evaluation::{evaluate, EvaluationMetrics};
pub use export::{to_csv_string, write_csv, ExportError};
pub use pipeline::{
    EvaluationReport, ForecastPipeline, ForecastReport, PipelineConfig, ResourceEvaluation,
    ResourceFailure, ResourceForecast, ResourceSpec, DEFAULT_HORIZON_DAYS,
};
pub use rollout::AutoregressiveForecaster;
pub use series::{future_dates, ForecastPoint, ForecastSeries, ForecastTable};
pub use summary::{
    daily_totals, latest_status, monthly_totals, resource_status, CapacityRule, ResourceStatus,
    TrendPoint,
};

use feature_engine::FeatureError;
use inference_engine::InferenceError;
use scaler::ScaleError;
use serde::Serialize;
use thiserror::Error;
use time_series::SeriesError;
use window_builder::WindowError;

/// Failure categories reported per resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// Not enough history to derive features or fill a window
    InsufficientData,
    /// A required base or target column is absent
    MissingColumn,
    /// The model artifact could not be resolved or loaded
    ModelUnavailable,
    /// Malformed input or configuration
    InvalidInput,
    /// The model failed during the rollout
    Prediction,
}

/// Errors that end one resource's forecast
#[derive(Debug, Clone, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Series(#[from] SeriesError),
    #[error(transparent)]
    Features(#[from] FeatureError),
    #[error(transparent)]
    Scale(#[from] ScaleError),
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error("Model unavailable for {resource}: {source}")]
    ModelUnavailable {
        resource: String,
        source: InferenceError,
    },
    #[error("Prediction failed at step {step}: {source}")]
    Prediction { step: usize, source: InferenceError },
    #[error("Target column {0} is not among the feature columns")]
    TargetNotInFeatures(String),
    #[error("Target index {index} out of range for {width} features")]
    TargetOutOfRange { index: usize, width: usize },
}

impl ForecastError {
    /// Category of this failure
    pub fn kind(&self) -> FailureKind {
        match self {
            ForecastError::Series(e) | ForecastError::Features(FeatureError::Series(e)) => match e {
                SeriesError::MissingColumn(_) => FailureKind::MissingColumn,
                _ => FailureKind::InvalidInput,
            },
            ForecastError::Features(FeatureError::InsufficientData { .. }) => FailureKind::InsufficientData,
            ForecastError::Features(_) => FailureKind::InvalidInput,
            ForecastError::Scale(ScaleError::InsufficientData(_)) => FailureKind::InsufficientData,
            ForecastError::Scale(ScaleError::MissingColumn(_)) => FailureKind::MissingColumn,
            ForecastError::Scale(_) => FailureKind::InvalidInput,
            ForecastError::Window(WindowError::InsufficientHistory { .. }) => FailureKind::InsufficientData,
            ForecastError::Window(WindowError::MissingColumn(_)) => FailureKind::MissingColumn,
            ForecastError::Window(_) => FailureKind::InvalidInput,
            ForecastError::ModelUnavailable { .. } => FailureKind::ModelUnavailable,
            ForecastError::Prediction { .. } => FailureKind::Prediction,
            ForecastError::TargetNotInFeatures(_) => FailureKind::MissingColumn,
            ForecastError::TargetOutOfRange { .. } => FailureKind::InvalidInput,
        }
    }
}
