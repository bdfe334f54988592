//! Greedy round-by-round mitigation search.
//!
//! Within a round every scheduled group is optimized on its own against the
//! same starting vector, and all winning levels are then applied together.
//! Rounds run in plan order, each starting from the previous round's output.

use std::sync::Arc;

use cyrisk_model::catalog::{feature_description, feature_name, level_for_label, option_label};
use cyrisk_model::{EncodedVector, GroupColumns, RiskScorer};

use crate::config::MitigationConfig;
use crate::error::MitigationError;
use crate::oracle::ImportanceOracle;
use crate::ranking::{plan_rounds, RoundPlan};
use crate::strategy::{
    reduction_percentage, ImplementationPriority, MitigationRound, MitigationStrategy,
    Recommendation, RiskCheckpoint, RiskDelta, SkippedFeature,
};

/// Picks the recommended level for a single-recommendation delta
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSelector {
    Index(usize),
    /// Human-readable level label, e.g. `"Yes"`
    Label(String),
}

pub struct MitigationOptimizer {
    scorer: RiskScorer,
    oracle: Option<Arc<dyn ImportanceOracle>>,
    config: MitigationConfig,
}

struct RoundOutcome {
    round: MitigationRound,
    next: EncodedVector,
}

impl MitigationOptimizer {
    /// The config's threshold replaces the scorer's.
    pub fn new(scorer: RiskScorer, config: MitigationConfig) -> Self {
        let scorer = scorer.with_threshold(config.threshold);
        Self {
            scorer,
            oracle: None,
            config,
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn ImportanceOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    pub fn config(&self) -> &MitigationConfig {
        &self.config
    }

    /// Round ordering for `vector`, importance-ranked when possible
    pub fn plan(&self, vector: &EncodedVector) -> RoundPlan {
        plan_rounds(
            self.oracle.as_deref(),
            &self.scorer,
            vector,
            self.config.seed,
        )
    }

    /// Encode raw answers and build the full strategy
    pub fn generate_strategy(&self, raw: &[usize]) -> Result<MitigationStrategy, MitigationError> {
        let vector = self.scorer.encode(raw)?;
        self.optimize(&vector)
    }

    pub fn optimize(&self, initial: &EncodedVector) -> Result<MitigationStrategy, MitigationError> {
        // score first so a broken classifier fails before the oracle runs
        self.scorer.score(initial)?;
        let plan = self.plan(initial);
        self.optimize_with_plan(initial, plan)
    }

    /// Run a caller-supplied plan
    pub fn optimize_with_plan(
        &self,
        initial: &EncodedVector,
        plan: RoundPlan,
    ) -> Result<MitigationStrategy, MitigationError> {
        let initial_risk = self.scorer.score(initial)?;
        let mut risk_trace = vec![RiskCheckpoint {
            label: "Initial".to_string(),
            risk: initial_risk,
        }];
        let mut rounds = Vec::new();
        let mut current = initial.clone();

        for features in plan.rounds.iter().filter(|f| !f.is_empty()) {
            let round_number = rounds.len() + 1;
            let RoundOutcome { round, next } = self.run_round(round_number, features, &current)?;
            risk_trace.push(RiskCheckpoint {
                label: format!("Round {round_number}"),
                risk: round.projected_risk,
            });
            rounds.push(round);
            current = next;
        }

        let final_risk = rounds.last().map_or(initial_risk, |r| r.projected_risk);
        let total_reduction = initial_risk - final_risk;
        let total_reduction_percentage = reduction_percentage(initial_risk, total_reduction);
        let implementation_priority =
            ImplementationPriority::from_reduction_percentage(total_reduction_percentage);

        log::info!(
            "mitigation strategy: {} rounds, risk {initial_risk:.4} -> {final_risk:.4} \
             ({total_reduction_percentage:.2}%), priority {}",
            rounds.len(),
            implementation_priority.as_str()
        );

        Ok(MitigationStrategy {
            initial_risk,
            final_risk,
            total_reduction,
            total_reduction_percentage,
            rounds,
            implementation_priority,
            ordering_source: plan.source,
            risk_trace,
        })
    }

    fn run_round(
        &self,
        round_number: usize,
        features: &[String],
        current: &EncodedVector,
    ) -> Result<RoundOutcome, MitigationError> {
        let schema = self.scorer.schema();
        let current_risk = self.scorer.score(current)?;

        let mut winners: Vec<(&GroupColumns, usize)> = Vec::with_capacity(features.len());
        let mut skipped_features = Vec::new();
        for code in features {
            let Some(group) = schema.group(code) else {
                log::warn!("No columns match feature '{code}', skipping it in round {round_number}");
                skipped_features.push(SkippedFeature::missing_columns(code));
                continue;
            };
            let (level, risk) = self.best_level(current, group)?;
            log::debug!("round {round_number}: {code} -> level {level} (risk {risk:.4})");
            winners.push((group, level));
        }

        let next = current.with_levels(&winners);
        let projected_risk = self.scorer.score(&next)?;
        let risk_reduction = current_risk - projected_risk;
        if projected_risk > current_risk {
            log::warn!(
                "round {round_number} raised risk from {current_risk:.4} to {projected_risk:.4}; \
                 simultaneous changes interact"
            );
        }

        let recommendations = winners
            .iter()
            .map(|&(group, level)| self.recommend(current, current_risk, group, level))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RoundOutcome {
            round: MitigationRound {
                round_number,
                features: features.to_vec(),
                current_risk,
                projected_risk,
                risk_reduction,
                reduction_percentage: reduction_percentage(current_risk, risk_reduction),
                recommendations,
                skipped_features,
            },
            next,
        })
    }

    /// Lowest-risk level for one group, lowest index winning exact ties
    fn best_level(
        &self,
        current: &EncodedVector,
        group: &GroupColumns,
    ) -> Result<(usize, f64), MitigationError> {
        let mut best = (0, f64::INFINITY);
        for level in 0..group.levels() {
            let risk = self.scorer.score(&current.with_level(group, level))?;
            if risk < best.1 {
                best = (level, risk);
            }
        }
        Ok(best)
    }

    fn recommend(
        &self,
        before: &EncodedVector,
        before_risk: f64,
        group: &GroupColumns,
        level: usize,
    ) -> Result<Recommendation, MitigationError> {
        let code = group.code();
        let current_index = group.active_level(before).unwrap_or(0);
        let risk_reduction = if self.config.isolated_deltas {
            let alone = self.scorer.score(&before.with_level(group, level))?;
            Some(before_risk - alone)
        } else {
            None
        };
        Ok(Recommendation {
            feature_group: code.to_string(),
            feature_name: feature_name(code),
            current_option: option_label(code, current_index),
            recommended_option: option_label(code, level),
            current_index,
            option_index: level,
            description: feature_description(code),
            risk_reduction,
        })
    }

    /// Risk change of applying one recommendation alone to the raw answers.
    ///
    /// An unknown group or option yields a zero delta; scoring failures
    /// still propagate.
    pub fn recommendation_delta(
        &self,
        raw: &[usize],
        feature_group: &str,
        option: &OptionSelector,
    ) -> Result<RiskDelta, MitigationError> {
        let baseline = self.scorer.encode(raw)?;
        let baseline_risk = self.scorer.score(&baseline)?;

        let Some(group) = self.scorer.schema().group(feature_group) else {
            log::warn!("No columns found for feature group: {feature_group}");
            return Ok(RiskDelta::unchanged());
        };
        let level = match option {
            OptionSelector::Index(i) => Some(*i).filter(|&i| i < group.levels()),
            OptionSelector::Label(label) => level_for_label(feature_group, label, group.levels()),
        };
        let Some(level) = level else {
            let available: Vec<String> = (0..group.levels())
                .map(|l| option_label(feature_group, l))
                .collect();
            log::warn!(
                "Could not find option {option:?} for {feature_group}; available options: {available:?}"
            );
            return Ok(RiskDelta::unchanged());
        };

        let new_risk = self.scorer.score(&baseline.with_level(group, level))?;
        let delta = RiskDelta::between(baseline_risk, new_risk);
        log::info!(
            "risk reduction for {feature_group} -> {}: {baseline_risk:.4} -> {new_risk:.4} \
             ({:.4}, {:.2}%)",
            option_label(feature_group, level),
            delta.risk_reduction,
            delta.risk_reduction_percentage
        );
        Ok(delta)
    }
}
