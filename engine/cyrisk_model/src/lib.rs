//! Risk scoring for cyber-risk questionnaires.
//!
//! This crate wraps a frozen multi-label classifier and turns questionnaire
//! answers (one level index per feature group) into one-hot encoded vectors,
//! per-category probabilities and a composite risk score.

pub mod backend;
pub mod catalog;
pub mod dense;
pub mod error;
pub mod schema;
pub mod scorer;

// Re-export the main types for convenience
pub use backend::{BackendError, Classifier};
pub use dense::{Activation, DenseLayer, DenseNetwork};
pub use error::ModelError;
pub use schema::{EncodedVector, FeatureGroup, FeatureSchema, GroupColumns};
pub use scorer::{
    composite_risk, sigmoid, RiskAssessment, RiskCategory, RiskScorer, DEFAULT_THRESHOLD,
    NUM_CATEGORIES,
};
