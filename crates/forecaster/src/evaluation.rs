//! Model Evaluation on Historical Windows

use crate::ForecastError;
use inference_engine::PredictiveModel;
use scaler::ScaledTable;
use serde::{Deserialize, Serialize};
use tracing::debug;
use window_builder::{WindowBuilder, WindowError};

/// Goodness-of-fit of a model over its training windows, in scaled units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Number of windows replayed
    pub samples: usize,
    /// Coefficient of determination
    pub r2: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
}

impl EvaluationMetrics {
    /// Score predictions against observed values
    pub fn from_pairs(actual: &[f64], predicted: &[f64]) -> Self {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return Self {
                samples: 0,
                r2: f64::NAN,
                mae: f64::NAN,
                rmse: f64::NAN,
            };
        }

        let count = n as f64;
        let mean = actual[..n].iter().sum::<f64>() / count;

        let mut abs_sum = 0.0;
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        for (y, p) in actual[..n].iter().zip(&predicted[..n]) {
            let residual = y - p;
            abs_sum += residual.abs();
            ss_res += residual * residual;
            ss_tot += (y - mean) * (y - mean);
        }

        // Constant targets: perfect predictions score 1, anything else 0
        let r2 = if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };

        Self {
            samples: n,
            r2,
            mae: abs_sum / count,
            rmse: (ss_res / count).sqrt(),
        }
    }
}

/// Replay every `(window, target)` pair of `scaled` through `model`
pub fn evaluate(
    model: &dyn PredictiveModel,
    scaled: &ScaledTable,
    target_column: &str,
    window_length: usize,
) -> Result<EvaluationMetrics, ForecastError> {
    let samples = WindowBuilder::new(window_length)?.build(scaled, target_column)?;
    if samples.is_empty() {
        return Err(WindowError::InsufficientHistory {
            required: window_length + 1,
            available: scaled.len(),
        }
        .into());
    }

    let mut actual = Vec::with_capacity(samples.len());
    let mut predicted = Vec::with_capacity(samples.len());
    for (i, sample) in samples.iter().enumerate() {
        let value = model
            .predict(&sample.window)
            .map_err(|source| ForecastError::Prediction { step: i + 1, source })?;
        actual.push(sample.target);
        predicted.push(value);
    }

    let metrics = EvaluationMetrics::from_pairs(&actual, &predicted);
    debug!(
        "Evaluated {} on {} windows: r2={:.3} mae={:.4} rmse={:.4}",
        target_column, metrics.samples, metrics.r2, metrics.mae, metrics.rmse
    );
    Ok(metrics)
}
