//! Per-Resource Model Resolution

use crate::model::{InputShape, LinearModel, PredictiveModel};
use crate::onnx::OnnxModel;
use crate::InferenceError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves the fitted model for a resource
pub trait ModelProvider {
    /// Model for `resource`, expecting windows of `shape`
    fn model_for(
        &self,
        resource: &str,
        shape: InputShape,
    ) -> Result<Arc<dyn PredictiveModel>, InferenceError>;
}

/// On-disk model format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// ONNX graph run through tract
    Onnx,
    /// JSON linear weights
    Linear,
}

impl ModelFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("onnx") => Some(ModelFormat::Onnx),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(ModelFormat::Linear),
            _ => None,
        }
    }
}

/// Location and format of a trained model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub path: PathBuf,
    pub format: ModelFormat,
}

impl ModelArtifact {
    /// Describe an artifact, inferring its format from the extension
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, InferenceError> {
        let path = path.into();
        let format = ModelFormat::from_path(&path).ok_or_else(|| {
            InferenceError::ModelLoadError(format!(
                "unrecognized model format: {} (expected .onnx or .json)",
                path.display()
            ))
        })?;
        Ok(Self { path, format })
    }

    /// Load the artifact for windows of `shape`
    pub fn load(&self, shape: InputShape) -> Result<Arc<dyn PredictiveModel>, InferenceError> {
        match self.format {
            ModelFormat::Onnx => Ok(Arc::new(OnnxModel::load(&self.path, shape)?)),
            ModelFormat::Linear => {
                let model = LinearModel::load(&self.path)?;
                if let Some(expected) = model.input_shape() {
                    if expected != shape {
                        return Err(InferenceError::InvalidInputShape {
                            expected: expected.to_string(),
                            actual: shape.to_string(),
                        });
                    }
                }
                Ok(Arc::new(model))
            }
        }
    }
}

/// Loads model artifacts from disk on every request
#[derive(Debug, Clone, Default)]
pub struct ArtifactRegistry {
    artifacts: HashMap<String, ModelArtifact>,
}

impl ArtifactRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the artifact for a resource
    pub fn register(&mut self, resource: impl Into<String>, artifact: ModelArtifact) {
        self.artifacts.insert(resource.into(), artifact);
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ModelProvider for ArtifactRegistry {
    fn model_for(
        &self,
        resource: &str,
        shape: InputShape,
    ) -> Result<Arc<dyn PredictiveModel>, InferenceError> {
        let artifact = self
            .artifacts
            .get(resource)
            .ok_or_else(|| InferenceError::ModelNotFound(resource.to_string()))?;

        debug!("Resolving {} model from {}", resource, artifact.path.display());
        artifact.load(shape).map_err(|e| {
            warn!("Model for {} unavailable: {}", resource, e);
            e
        })
    }
}

/// Holds models that are already loaded
#[derive(Default, Clone)]
pub struct StaticRegistry {
    models: HashMap<String, Arc<dyn PredictiveModel>>,
}

impl StaticRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loaded model for a resource
    pub fn register<M>(&mut self, resource: impl Into<String>, model: M)
    where
        M: PredictiveModel + 'static,
    {
        self.models.insert(resource.into(), Arc::new(model));
    }
}

impl ModelProvider for StaticRegistry {
    fn model_for(
        &self,
        resource: &str,
        shape: InputShape,
    ) -> Result<Arc<dyn PredictiveModel>, InferenceError> {
        let model = self
            .models
            .get(resource)
            .ok_or_else(|| InferenceError::ModelNotFound(resource.to_string()))?;

        if let Some(expected) = model.input_shape() {
            if expected != shape {
                return Err(InferenceError::InvalidInputShape {
                    expected: expected.to_string(),
                    actual: shape.to_string(),
                });
            }
        }
        Ok(Arc::clone(model))
    }
}
