//! Predictive Model Capability

use crate::InferenceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};
use window_builder::Window;

/// Expected model input dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    /// Rows per window
    pub window_length: usize,
    /// Features per row
    pub feature_count: usize,
}

impl InputShape {
    /// Shape of a concrete window
    pub fn of(window: &Window) -> Self {
        Self {
            window_length: window.len(),
            feature_count: window.width(),
        }
    }

    /// Fail unless `window` has exactly this shape
    pub fn check(&self, window: &Window) -> Result<(), InferenceError> {
        let actual = Self::of(window);
        if actual != *self {
            return Err(InferenceError::InvalidInputShape {
                expected: self.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} x {}]", self.window_length, self.feature_count)
    }
}

/// A fitted model: one scaled window in, one scaled target value out.
///
/// Implementations are supplied already trained; nothing here retrains them.
pub trait PredictiveModel {
    /// Predict the next scaled target value
    fn predict(&self, window: &Window) -> Result<f64, InferenceError>;

    /// Input shape the model was built for, when known
    fn input_shape(&self) -> Option<InputShape> {
        None
    }
}

/// Adapter turning a closure into a model
pub struct FnModel<F> {
    func: F,
}

impl<F> FnModel<F>
where
    F: Fn(&Window) -> f64,
{
    /// Wrap a closure
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> PredictiveModel for FnModel<F>
where
    F: Fn(&Window) -> f64,
{
    fn predict(&self, window: &Window) -> Result<f64, InferenceError> {
        Ok((self.func)(window))
    }
}

/// Linear model over the flattened window, loaded from a JSON artifact.
///
/// `weights` are row-major over the window, oldest row first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub window_length: usize,
    pub feature_count: usize,
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearModel {
    /// Create a linear model, checking the weight count
    pub fn new(
        window_length: usize,
        feature_count: usize,
        weights: Vec<f64>,
        bias: f64,
    ) -> Result<Self, InferenceError> {
        let model = Self {
            window_length,
            feature_count,
            weights,
            bias,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), InferenceError> {
        let expected = self
            .window_length
            .checked_mul(self.feature_count)
            .ok_or_else(|| {
                InferenceError::ModelLoadError(format!(
                    "linear model dimensions {}x{} overflow",
                    self.window_length, self.feature_count
                ))
            })?;
        if self.weights.len() != expected {
            return Err(InferenceError::ModelLoadError(format!(
                "linear model has {} weights, expected {}",
                self.weights.len(),
                expected
            )));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(InferenceError::ModelLoadError(
                "linear model holds non-finite parameters".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a JSON artifact
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let model: LinearModel = serde_json::from_str(json)
            .map_err(|e| InferenceError::ModelLoadError(format!("invalid linear artifact: {}", e)))?;
        model.validate()?;
        Ok(model)
    }

    /// Load a JSON artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading linear model: {}", path.display());
        let json = std::fs::read_to_string(path)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

impl PredictiveModel for LinearModel {
    fn predict(&self, window: &Window) -> Result<f64, InferenceError> {
        InputShape {
            window_length: self.window_length,
            feature_count: self.feature_count,
        }
        .check(window)?;

        let value = window
            .rows()
            .flat_map(|row| row.iter())
            .zip(self.weights.iter())
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.bias;

        debug!("Linear prediction: {:.6}", value);
        Ok(value)
    }

    fn input_shape(&self) -> Option<InputShape> {
        Some(InputShape {
            window_length: self.window_length,
            feature_count: self.feature_count,
        })
    }
}
