use cyrisk_model::ModelError;
use thiserror::Error;

/// Request-level failure of a mitigation run.
///
/// Ranking problems and unknown feature groups never show up here; they
/// degrade to the fallback schedule or a skipped group instead.
#[derive(Debug, Error)]
pub enum MitigationError {
    #[error("{0}")]
    Model(#[from] ModelError),
}

impl MitigationError {
    pub fn is_scoring_failure(&self) -> bool {
        match self {
            MitigationError::Model(e) => e.is_scoring_failure(),
        }
    }
}
