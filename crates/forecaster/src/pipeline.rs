//! Multi-Resource Forecast Pipeline
//!
//! Every resource runs its own feature table, scaler state and rollout
//! window, built fresh per call. A failing resource is reported in the run
//! report and never stops the others.

use crate::evaluation::{evaluate, EvaluationMetrics};
use crate::rollout::AutoregressiveForecaster;
use crate::series::{ForecastSeries, ForecastTable};
use crate::{FailureKind, ForecastError};
use chrono::NaiveDate;
use feature_engine::{FeatureConfig, FeatureEngineer};
use inference_engine::{InputShape, ModelProvider, PredictiveModel};
use metrics::{counter, histogram};
use scaler::{MinMaxScaler, ScaledTable, ScalerState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time_series::SeriesProvider;
use tracing::{info, info_span, warn};
use uuid::Uuid;
use window_builder::{WindowBuilder, WindowError, DEFAULT_WINDOW_LENGTH};

/// Default forecast horizon (days)
pub const DEFAULT_HORIZON_DAYS: usize = 7;

/// One forecastable resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Key used to resolve the model
    pub name: String,
    /// Output column label
    pub label: String,
    /// Series source passed to the provider
    pub source: String,
    /// Column being forecast; must be one of `feature_columns`
    pub target_column: String,
    /// Base feature columns, in model input order
    pub feature_columns: Vec<String>,
}

/// Pipeline settings shared by every resource of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub horizon_days: usize,
    pub window_length: usize,
    pub features: FeatureConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            window_length: DEFAULT_WINDOW_LENGTH,
            features: FeatureConfig::default(),
        }
    }
}

/// Successful forecast of one resource
#[derive(Debug, Clone)]
pub struct ResourceForecast {
    pub resource: String,
    /// Forecast in original units
    pub series: ForecastSeries,
    /// Normalization fitted for this resource only
    pub scaler: ScalerState,
    /// Final feature column order fed to the model
    pub feature_columns: Vec<String>,
    /// Newest date in the raw series; forecasts start the day after
    pub last_observed: NaiveDate,
}

/// Resource-scoped failure
#[derive(Debug, Clone)]
pub struct ResourceFailure {
    pub resource: String,
    pub error: ForecastError,
}

impl ResourceFailure {
    /// Failure category
    pub fn kind(&self) -> FailureKind {
        self.error.kind()
    }
}

/// Outcome of a multi-resource forecast run
#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub run_id: Uuid,
    /// Successful forecasts aligned on one date index
    pub table: ForecastTable,
    pub forecasts: Vec<ResourceForecast>,
    pub failures: Vec<ResourceFailure>,
}

impl ForecastReport {
    /// Check if every resource produced a forecast
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Forecast of a resource by name
    pub fn forecast(&self, resource: &str) -> Option<&ResourceForecast> {
        self.forecasts.iter().find(|f| f.resource == resource)
    }

    /// Failure of a resource by name
    pub fn failure(&self, resource: &str) -> Option<&ResourceFailure> {
        self.failures.iter().find(|f| f.resource == resource)
    }
}

/// Model fit of one resource
#[derive(Debug, Clone)]
pub struct ResourceEvaluation {
    pub resource: String,
    pub target_column: String,
    pub metrics: EvaluationMetrics,
}

/// Outcome of a multi-resource evaluation run
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub run_id: Uuid,
    pub evaluations: Vec<ResourceEvaluation>,
    pub failures: Vec<ResourceFailure>,
}

/// Scaled history of one resource, ready for the model
struct Prepared {
    scaled: ScaledTable,
    state: ScalerState,
    target_index: usize,
    model: Arc<dyn PredictiveModel>,
    last_known: Option<NaiveDate>,
}

/// Runs the feature, scaling, window and rollout stages per resource
pub struct ForecastPipeline {
    config: PipelineConfig,
    engineer: FeatureEngineer,
    windows: WindowBuilder,
}

impl ForecastPipeline {
    /// Create a pipeline, validating its configuration
    pub fn new(config: PipelineConfig) -> Result<Self, ForecastError> {
        let engineer = FeatureEngineer::new(config.features.clone())?;
        let windows = WindowBuilder::new(config.window_length)?;
        Ok(Self {
            config,
            engineer,
            windows,
        })
    }

    /// Get pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn prepare(
        &self,
        spec: &ResourceSpec,
        series: &dyn SeriesProvider,
        models: &dyn ModelProvider,
    ) -> Result<Prepared, ForecastError> {
        let columns = self.engineer.feature_columns(&spec.feature_columns);
        if !columns.iter().any(|c| *c == spec.target_column) {
            return Err(ForecastError::TargetNotInFeatures(spec.target_column.clone()));
        }

        let raw = series.load(&spec.source)?;
        let last_known = raw.last_date();
        let features = self.engineer.build(&raw, &spec.feature_columns)?;
        let (state, scaled) = MinMaxScaler::fit_transform(&features)?;

        let target_index = scaled
            .column_index(&spec.target_column)
            .ok_or_else(|| ForecastError::TargetNotInFeatures(spec.target_column.clone()))?;

        let shape = InputShape {
            window_length: self.windows.length(),
            feature_count: scaled.columns().len(),
        };
        let model = models
            .model_for(&spec.name, shape)
            .map_err(|source| ForecastError::ModelUnavailable {
                resource: spec.name.clone(),
                source,
            })?;

        Ok(Prepared {
            scaled,
            state,
            target_index,
            model,
            last_known,
        })
    }

    /// Forecast one resource `horizon_days` ahead
    pub fn forecast_resource(
        &self,
        spec: &ResourceSpec,
        series: &dyn SeriesProvider,
        models: &dyn ModelProvider,
    ) -> Result<ResourceForecast, ForecastError> {
        let prepared = self.prepare(spec, series, models)?;
        let window = self.windows.latest(&prepared.scaled)?;
        let seed_date = prepared.scaled.last_date();
        let last_observed = prepared
            .last_known
            .or(seed_date)
            .ok_or(WindowError::InsufficientHistory {
                required: self.windows.length(),
                available: 0,
            })?;
        if let Some(seed_date) = seed_date.filter(|d| *d < last_observed) {
            warn!(
                "{}: rows after {} lack complete features; dates still start after {}",
                spec.name, seed_date, last_observed
            );
        }

        let steps = self.config.horizon_days;
        let scaled_predictions = AutoregressiveForecaster::new(prepared.model.as_ref()).rollout(
            window,
            prepared.target_index,
            steps,
        )?;
        histogram!("forecast_rollout_steps").record(steps as f64);

        let values = MinMaxScaler::inverse(&scaled_predictions, &spec.target_column, &prepared.state)?;
        let forecast = ForecastSeries::new(spec.label.clone(), last_observed, &values);

        info!(
            "Forecast {} for {} days after {}",
            spec.name, steps, last_observed
        );

        Ok(ResourceForecast {
            resource: spec.name.clone(),
            series: forecast,
            scaler: prepared.state,
            feature_columns: prepared.scaled.columns().to_vec(),
            last_observed,
        })
    }

    /// Forecast every resource, isolating failures
    pub fn forecast_all(
        &self,
        specs: &[ResourceSpec],
        series: &dyn SeriesProvider,
        models: &dyn ModelProvider,
    ) -> ForecastReport {
        let run_id = Uuid::new_v4();
        let run_span = info_span!("forecast_run", run_id = %run_id);
        let _run = run_span.enter();

        let mut forecasts = Vec::with_capacity(specs.len());
        let mut failures = Vec::new();

        for spec in specs {
            let span = info_span!("resource", name = %spec.name);
            let _enter = span.enter();

            match self.forecast_resource(spec, series, models) {
                Ok(forecast) => {
                    counter!("forecast_resources_total", "outcome" => "success").increment(1);
                    forecasts.push(forecast);
                }
                Err(error) => {
                    counter!("forecast_resources_total", "outcome" => "failure").increment(1);
                    warn!("Forecast for {} failed ({:?}): {}", spec.name, error.kind(), error);
                    failures.push(ResourceFailure {
                        resource: spec.name.clone(),
                        error,
                    });
                }
            }
        }

        let series: Vec<ForecastSeries> = forecasts.iter().map(|f| f.series.clone()).collect();
        let table = ForecastTable::from_series(&series);

        info!(
            "Forecast run complete: {} succeeded, {} failed",
            forecasts.len(),
            failures.len()
        );

        ForecastReport {
            run_id,
            table,
            forecasts,
            failures,
        }
    }

    /// Score one resource's model over its historical windows
    pub fn evaluate_resource(
        &self,
        spec: &ResourceSpec,
        series: &dyn SeriesProvider,
        models: &dyn ModelProvider,
    ) -> Result<EvaluationMetrics, ForecastError> {
        let prepared = self.prepare(spec, series, models)?;
        evaluate(
            prepared.model.as_ref(),
            &prepared.scaled,
            &spec.target_column,
            self.windows.length(),
        )
    }

    /// Score every resource, isolating failures
    pub fn evaluate_all(
        &self,
        specs: &[ResourceSpec],
        series: &dyn SeriesProvider,
        models: &dyn ModelProvider,
    ) -> EvaluationReport {
        let run_id = Uuid::new_v4();
        let run_span = info_span!("evaluation_run", run_id = %run_id);
        let _run = run_span.enter();

        let mut evaluations = Vec::with_capacity(specs.len());
        let mut failures = Vec::new();

        for spec in specs {
            let span = info_span!("resource", name = %spec.name);
            let _enter = span.enter();

            match self.evaluate_resource(spec, series, models) {
                Ok(metrics) => {
                    info!(
                        "{}: r2={:.2} mae={:.2} rmse={:.2}",
                        spec.target_column, metrics.r2, metrics.mae, metrics.rmse
                    );
                    evaluations.push(ResourceEvaluation {
                        resource: spec.name.clone(),
                        target_column: spec.target_column.clone(),
                        metrics,
                    });
                }
                Err(error) => {
                    warn!("Evaluation for {} failed: {}", spec.name, error);
                    failures.push(ResourceFailure {
                        resource: spec.name.clone(),
                        error,
                    });
                }
            }
        }

        EvaluationReport {
            run_id,
            evaluations,
            failures,
        }
    }
}
