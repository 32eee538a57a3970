//! ONNX Model Adapter

use crate::model::{InputShape, PredictiveModel};
use crate::InferenceError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tract_onnx::prelude::*;
use window_builder::Window;

type RunnablePlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Sequence model exported to ONNX, run through tract.
///
/// Input is a `[1, window_length, feature_count]` f32 tensor; the first
/// element of the first output is the scaled prediction.
pub struct OnnxModel {
    plan: RunnablePlan,
    shape: InputShape,
    path: PathBuf,
}

impl OnnxModel {
    /// Load and optimize a model for a fixed input shape
    pub fn load(path: impl AsRef<Path>, shape: InputShape) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading ONNX model {} with input {}", path.display(), shape);

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    f32::fact([1, shape.window_length, shape.feature_count]).into(),
                )
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            plan,
            shape,
            path: path.to_path_buf(),
        })
    }

    /// Get model path
    pub fn model_path(&self) -> &Path {
        &self.path
    }
}

impl PredictiveModel for OnnxModel {
    fn predict(&self, window: &Window) -> Result<f64, InferenceError> {
        self.shape.check(window)?;

        let data: Vec<f32> = window
            .rows()
            .flat_map(|row| row.iter().map(|&v| v as f32))
            .collect();
        let input = Tensor::from_shape(&[1, self.shape.window_length, self.shape.feature_count], &data)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no outputs".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
        let value = view
            .iter()
            .next()
            .copied()
            .ok_or_else(|| InferenceError::InferenceFailed("empty model output".to_string()))?;

        debug!("ONNX prediction: {:.6}", value);
        Ok(f64::from(value))
    }

    fn input_shape(&self) -> Option<InputShape> {
        Some(self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let shape = InputShape {
            window_length: 30,
            feature_count: 10,
        };
        let result = OnnxModel::load("/nonexistent/icu_model.onnx", shape);
        assert!(matches!(result, Err(InferenceError::ModelLoadError(_))));
    }
}
