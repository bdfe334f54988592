//! Composite risk scoring.
//!
//! The classifier emits one logit per risk category. Each logit is turned
//! into an independent probability with a sigmoid, and the probabilities are
//! blended into one scalar:
//!
//! `risk = 0.5 * mean(p) + 0.5 * count(p > threshold) / 5`
//!
//! The second term keeps a single severe category from being averaged away
//! by four mild ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::backend::{BackendError, Classifier};
use crate::error::ModelError;
use crate::schema::{EncodedVector, FeatureSchema};

/// Probability above which a category counts as exceeded
pub const DEFAULT_THRESHOLD: f64 = 0.375;

/// Number of risk categories the classifier predicts
pub const NUM_CATEGORIES: usize = 5;

/// Risk categories, in classifier output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskCategory {
    Ransomware,
    Phishing,
    DataBreach,
    InsiderAttack,
    SupplyChain,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; NUM_CATEGORIES] = [
        RiskCategory::Ransomware,
        RiskCategory::Phishing,
        RiskCategory::DataBreach,
        RiskCategory::InsiderAttack,
        RiskCategory::SupplyChain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Ransomware => "ransomware",
            RiskCategory::Phishing => "phishing",
            RiskCategory::DataBreach => "dataBreach",
            RiskCategory::InsiderAttack => "insiderAttack",
            RiskCategory::SupplyChain => "supplyChain",
        }
    }
}

/// Per-category probabilities and the composite score for one vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub probabilities: Vec<f64>,
    pub risk_types: Vec<RiskCategory>,
    pub risk_score: f64,
}

impl RiskAssessment {
    pub fn probability(&self, category: RiskCategory) -> Option<f64> {
        self.risk_types
            .iter()
            .position(|c| *c == category)
            .and_then(|idx| self.probabilities.get(idx).copied())
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Blend of mean probability and share of categories above `threshold`
pub fn composite_risk(probabilities: &[f64], threshold: f64) -> f64 {
    if probabilities.is_empty() {
        return 0.0;
    }
    let n = probabilities.len() as f64;
    let mean = probabilities.iter().sum::<f64>() / n;
    let exceeded = probabilities.iter().filter(|&&p| p > threshold).count() as f64;
    0.5 * mean + 0.5 * (exceeded / n)
}

/// Scores encoded vectors against a frozen classifier.
///
/// Cloning is cheap: the classifier and schema are shared, read-only.
#[derive(Clone)]
pub struct RiskScorer {
    classifier: Arc<dyn Classifier>,
    schema: Arc<FeatureSchema>,
    threshold: f64,
}

impl fmt::Debug for RiskScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskScorer")
            .field("classifier", &self.classifier.backend_name())
            .field("width", &self.schema.width())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl RiskScorer {
    /// Pair a classifier with the schema its input columns follow
    pub fn new(
        classifier: Arc<dyn Classifier>,
        schema: Arc<FeatureSchema>,
    ) -> Result<Self, ModelError> {
        if classifier.input_width() != schema.width() {
            return Err(ModelError::DimensionMismatch {
                expected: classifier.input_width(),
                actual: schema.width(),
            });
        }
        Ok(Self {
            classifier,
            schema,
            threshold: DEFAULT_THRESHOLD,
        })
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.backend_name()
    }

    pub fn encode(&self, raw: &[usize]) -> Result<EncodedVector, ModelError> {
        self.schema.encode(raw)
    }

    /// Sigmoid probabilities for each risk category
    pub fn probabilities(&self, vector: &EncodedVector) -> Result<Vec<f64>, ModelError> {
        let expected = self.classifier.input_width();
        if vector.len() != expected {
            return Err(ModelError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        self.schema.validate(vector)?;

        let logits = self.classifier.logits(vector.as_slice())?;
        if logits.len() != NUM_CATEGORIES {
            return Err(BackendError::InferenceError(format!(
                "classifier returned {} outputs, expected {NUM_CATEGORIES}",
                logits.len()
            ))
            .into());
        }
        if logits.iter().any(|l| l.is_nan()) {
            return Err(BackendError::InferenceError("classifier returned NaN".into()).into());
        }
        Ok(logits.into_iter().map(sigmoid).collect())
    }

    /// Composite risk score in `[0, 1]`
    pub fn score(&self, vector: &EncodedVector) -> Result<f64, ModelError> {
        let probabilities = self.probabilities(vector)?;
        Ok(composite_risk(&probabilities, self.threshold))
    }

    pub fn assess(&self, vector: &EncodedVector) -> Result<RiskAssessment, ModelError> {
        let probabilities = self.probabilities(vector)?;
        let risk_score = composite_risk(&probabilities, self.threshold);
        log::debug!("assessed probabilities {probabilities:?} -> risk {risk_score:.4}");
        Ok(RiskAssessment {
            probabilities,
            risk_types: RiskCategory::ALL.to_vec(),
            risk_score,
        })
    }
}
