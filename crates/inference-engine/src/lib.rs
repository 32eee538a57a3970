//! Predictive Model Adapters
//!
//! Wraps externally trained models behind a single `predict(window)`
//! capability and resolves them per resource.

mod model;
mod onnx;
mod registry;

pub use model::{FnModel, InputShape, LinearModel, PredictiveModel};
pub use onnx::OnnxModel;
pub use registry::{ArtifactRegistry, ModelArtifact, ModelFormat, ModelProvider, StaticRegistry};

use thiserror::Error;

/// Errors during model loading or inference
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
    #[error("No model registered for resource: {0}")]
    ModelNotFound(String),
}
