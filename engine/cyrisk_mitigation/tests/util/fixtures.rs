use std::sync::Arc;

use cyrisk_mitigation::{ImportanceOracle, ImportanceScore, OracleError};
use cyrisk_model::{
    BackendError, Classifier, EncodedVector, FeatureGroup, FeatureSchema, RiskScorer,
};

type LevelFn = dyn Fn(&[usize]) -> Result<f64, BackendError> + Send + Sync;

/// Classifier whose five outputs all carry the same probability, computed
/// from the decoded level of every group.
pub struct LevelClassifier {
    schema: Arc<FeatureSchema>,
    probability: Box<LevelFn>,
}

impl LevelClassifier {
    pub fn new(
        schema: Arc<FeatureSchema>,
        probability: impl Fn(&[usize]) -> Result<f64, BackendError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            schema,
            probability: Box::new(probability),
        }
    }
}

impl Classifier for LevelClassifier {
    fn input_width(&self) -> usize {
        self.schema.width()
    }

    fn logits(&self, input: &[f64]) -> Result<Vec<f64>, BackendError> {
        let levels = self
            .schema
            .decode(&EncodedVector::from_values(input.to_vec()))
            .map_err(|e| BackendError::InvalidInput(e.to_string()))?;
        let p = (self.probability)(&levels)?;
        Ok(vec![logit(p); 5])
    }

    fn backend_name(&self) -> &str {
        "level-fixture"
    }
}

pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

#[allow(dead_code)]
pub fn scorer_with(
    schema: Arc<FeatureSchema>,
    probability: impl Fn(&[usize]) -> Result<f64, BackendError> + Send + Sync + 'static,
) -> RiskScorer {
    let classifier = LevelClassifier::new(schema.clone(), probability);
    RiskScorer::new(Arc::new(classifier), schema).unwrap()
}

/// Level 0 of every group is the risky answer: all groups at 0 gives 0.9 per
/// category, every group moved off 0 gives 0.1.
#[allow(dead_code)]
pub fn level_zero_alarm(schema: Arc<FeatureSchema>) -> RiskScorer {
    scorer_with(schema, |levels| {
        let zeros = levels.iter().filter(|&&l| l == 0).count() as f64;
        Ok(0.1 + 0.8 * zeros / levels.len() as f64)
    })
}

#[allow(dead_code)]
pub fn standard_schema() -> Arc<FeatureSchema> {
    Arc::new(FeatureSchema::standard())
}

/// Two categories with two groups each
#[allow(dead_code)]
pub fn small_schema() -> Arc<FeatureSchema> {
    Arc::new(
        FeatureSchema::new(vec![
            FeatureGroup::new("1.1", 3),
            FeatureGroup::new("1.2", 2),
            FeatureGroup::new("2.1", 4),
            FeatureGroup::new("2.2", 3),
        ])
        .unwrap(),
    )
}

/// Oracle returning a fixed list of scores
#[allow(dead_code)]
pub struct StaticOracle(pub Vec<ImportanceScore>);

impl ImportanceOracle for StaticOracle {
    fn attribute(
        &self,
        _scorer: &RiskScorer,
        _vector: &EncodedVector,
        _seed: u64,
    ) -> Result<Vec<ImportanceScore>, OracleError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Oracle that is always down
#[allow(dead_code)]
pub struct OfflineOracle;

impl ImportanceOracle for OfflineOracle {
    fn attribute(
        &self,
        _scorer: &RiskScorer,
        _vector: &EncodedVector,
        _seed: u64,
    ) -> Result<Vec<ImportanceScore>, OracleError> {
        Err(OracleError::Unavailable("attribution service offline".into()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

#[allow(dead_code)]
pub fn importance(category: &str, group: &str, value: f64) -> ImportanceScore {
    ImportanceScore {
        output: 0,
        category: category.to_string(),
        feature_group: group.to_string(),
        level: 0,
        value,
    }
}

#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
