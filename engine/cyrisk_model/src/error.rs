use thiserror::Error;

use crate::backend::BackendError;

/// Errors raised while encoding questionnaire answers or scoring vectors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Expected {expected} input values (one per feature group), got {actual}")]
    InputLength { expected: usize, actual: usize },
    #[error("Level {level} is out of range for feature group {group} ({levels} levels)")]
    LevelOutOfRange {
        group: String,
        level: usize,
        levels: usize,
    },
    #[error("Vector width {actual} does not match model input width {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Feature group {group} has {active} active indicators, expected exactly one")]
    InvalidVector { group: String, active: usize },
    #[error("Invalid feature schema: {0}")]
    InvalidSchema(String),
    #[error("Scoring failed: {0}")]
    ScoringFailure(#[from] BackendError),
}

impl ModelError {
    /// True when the classifier itself failed, as opposed to bad input
    pub fn is_scoring_failure(&self) -> bool {
        matches!(self, ModelError::ScoringFailure(_))
    }
}
