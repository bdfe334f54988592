//! Classifier seam and error types for model inference

use thiserror::Error;

/// Errors that can occur inside a classifier backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Model loading failed: {0}")]
    LoadError(String),
    #[error("Inference failed: {0}")]
    InferenceError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A frozen multi-label classifier producing one raw logit per risk category.
///
/// Implementations must be free of side effects: the same input always
/// yields the same logits, so a single instance can serve many requests at
/// once.
pub trait Classifier: Send + Sync {
    /// Width of the encoded input the model was trained on
    fn input_width(&self) -> usize;

    /// Run the model on one encoded input and return raw logits
    fn logits(&self, input: &[f64]) -> Result<Vec<f64>, BackendError>;

    /// Get backend name/identifier
    fn backend_name(&self) -> &str;
}
