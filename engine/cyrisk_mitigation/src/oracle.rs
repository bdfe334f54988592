//! Importance oracle boundary.
//!
//! An oracle attributes the classifier's outputs to feature groups. The
//! optimizer only uses the attributions to order groups; see
//! [`crate::ranking`].

use cyrisk_model::{EncodedVector, RiskScorer};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attribution of one classifier output to one (feature group, level)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportanceScore {
    /// Index of the classifier output (risk category)
    pub output: usize,
    /// Category the feature group is ranked within
    pub category: String,
    pub feature_group: String,
    pub level: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error("Importance oracle unavailable: {0}")]
    Unavailable(String),
    #[error("Importance oracle returned no scores")]
    Empty,
}

/// Source of per-feature importance values.
///
/// `seed` must drive any sampling the oracle does, so that the same request
/// always yields the same attributions.
pub trait ImportanceOracle: Send + Sync {
    fn attribute(
        &self,
        scorer: &RiskScorer,
        vector: &EncodedVector,
        seed: u64,
    ) -> Result<Vec<ImportanceScore>, OracleError>;

    fn name(&self) -> &str;
}

/// Baseline-perturbation attribution.
///
/// For each feature group, draws `samples` random baseline levels and
/// attributes to the group the mean drop of every output probability when
/// only that group is moved from its current level to the baseline level.
/// Groups whose current answer drives the risk up get large positive values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerturbationOracle {
    samples: usize,
}

impl Default for PerturbationOracle {
    fn default() -> Self {
        Self { samples: 32 }
    }
}

impl PerturbationOracle {
    pub fn new(samples: usize) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}

impl ImportanceOracle for PerturbationOracle {
    fn attribute(
        &self,
        scorer: &RiskScorer,
        vector: &EncodedVector,
        seed: u64,
    ) -> Result<Vec<ImportanceScore>, OracleError> {
        if self.samples == 0 {
            return Err(OracleError::Unavailable(
                "no baseline samples configured".into(),
            ));
        }
        let unavailable = |e: cyrisk_model::ModelError| OracleError::Unavailable(e.to_string());
        let base = scorer.probabilities(vector).map_err(unavailable)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut scores = Vec::new();

        for group in scorer.schema().groups() {
            let Some(current) = group.active_level(vector) else {
                continue;
            };
            // every level is cheap to evaluate once; sampling only weights them
            let per_level = (0..group.levels())
                .map(|level| scorer.probabilities(&vector.with_level(group, level)))
                .collect::<Result<Vec<_>, _>>()
                .map_err(unavailable)?;

            let mut drops = vec![0.0; base.len()];
            for _ in 0..self.samples {
                let level = rng.gen_range(0..group.levels());
                for (d, (b, p)) in drops.iter_mut().zip(base.iter().zip(&per_level[level])) {
                    *d += b - p;
                }
            }

            let n = self.samples as f64;
            scores.extend(drops.into_iter().enumerate().map(|(output, d)| ImportanceScore {
                output,
                category: group.category().to_string(),
                feature_group: group.code().to_string(),
                level: current,
                value: d / n,
            }));
        }

        if scores.is_empty() {
            return Err(OracleError::Empty);
        }
        log::debug!(
            "perturbation oracle produced {} scores from {} samples per group",
            scores.len(),
            self.samples
        );
        Ok(scores)
    }

    fn name(&self) -> &str {
        "perturbation"
    }
}
