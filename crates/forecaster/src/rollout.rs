//! Autoregressive Rollout
//!
//! Each step predicts the next scaled target value, then slides a synthetic
//! row into the window: a copy of the newest row with only the target
//! position overwritten by the prediction.
//!
//! Every other feature in the synthetic row, including the target's own lag
//! and rolling columns, is carried forward unchanged from the prior day. They
//! are never re-derived from predictions, so they go stale after the first
//! step and accuracy degrades with horizon length. This is the intended
//! forecast semantics; re-deriving them would change the forecasts.

use crate::ForecastError;
use inference_engine::{InferenceError, PredictiveModel};
use tracing::debug;
use window_builder::Window;

/// Multi-step forecaster feeding predictions back as input
pub struct AutoregressiveForecaster<'m> {
    model: &'m dyn PredictiveModel,
}

impl<'m> AutoregressiveForecaster<'m> {
    /// Create a forecaster around a fitted model
    pub fn new(model: &'m dyn PredictiveModel) -> Self {
        Self { model }
    }

    /// Run `steps` predictions starting from `window`, in scaled units.
    ///
    /// The window is consumed; it is mutated in place as the rollout slides.
    pub fn rollout(
        &self,
        mut window: Window,
        target_index: usize,
        steps: usize,
    ) -> Result<Vec<f64>, ForecastError> {
        if target_index >= window.width() {
            return Err(ForecastError::TargetOutOfRange {
                index: target_index,
                width: window.width(),
            });
        }

        let mut predictions = Vec::with_capacity(steps);
        let mut next_row = vec![0.0; window.width()];

        for step in 1..=steps {
            let predicted = self
                .model
                .predict(&window)
                .map_err(|source| ForecastError::Prediction { step, source })?;

            if !predicted.is_finite() {
                return Err(ForecastError::Prediction {
                    step,
                    source: InferenceError::InferenceFailed(format!(
                        "non-finite prediction {}",
                        predicted
                    )),
                });
            }
            predictions.push(predicted);

            next_row.copy_from_slice(window.last_row());
            next_row[target_index] = predicted;
            window.slide(&next_row)?;

            debug!("Step {}/{}: predicted {:.6}", step, steps, predicted);
        }

        Ok(predictions)
    }
}
