//! Round planning.
//!
//! Importance values are summed per feature group, groups are ranked inside
//! their own category, and round `r` collects every group whose in-category
//! rank is `r`. When no usable ranking exists a fixed schedule is used and
//! the plan says so.

use cyrisk_model::{EncodedVector, FeatureSchema, RiskScorer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::oracle::{ImportanceOracle, ImportanceScore, OracleError};

/// Why the fallback schedule was used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackReason {
    NoOracle,
    OracleFailed { message: String },
    EmptyRanking,
}

/// Where a round ordering came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OrderingSource {
    Importance { oracle: String },
    Fallback { reason: FallbackReason },
}

/// Ordered rounds of feature-group codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundPlan {
    pub rounds: Vec<Vec<String>>,
    pub source: OrderingSource,
}

impl RoundPlan {
    pub fn fallback(schema: &FeatureSchema, reason: FallbackReason) -> Self {
        Self {
            rounds: fallback_rounds(schema),
            source: OrderingSource::Fallback { reason },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, OrderingSource::Fallback { .. })
    }
}

/// Ask the oracle for a ranking, degrading to the fallback schedule
pub fn plan_rounds(
    oracle: Option<&dyn ImportanceOracle>,
    scorer: &RiskScorer,
    vector: &EncodedVector,
    seed: u64,
) -> RoundPlan {
    let schema = scorer.schema();
    let Some(oracle) = oracle else {
        log::warn!("no importance oracle configured, using fallback feature rounds");
        return RoundPlan::fallback(schema, FallbackReason::NoOracle);
    };

    match oracle.attribute(scorer, vector, seed) {
        Ok(scores) => {
            let rounds = rounds_from_importance(&scores);
            if rounds.is_empty() {
                log::warn!("importance ranking was empty, using fallback feature rounds");
                return RoundPlan::fallback(schema, FallbackReason::EmptyRanking);
            }
            log::info!(
                "generated {} importance-ranked rounds with oracle '{}'",
                rounds.len(),
                oracle.name()
            );
            RoundPlan {
                rounds,
                source: OrderingSource::Importance {
                    oracle: oracle.name().to_string(),
                },
            }
        }
        Err(OracleError::Empty) => {
            log::warn!("importance oracle returned nothing, using fallback feature rounds");
            RoundPlan::fallback(schema, FallbackReason::EmptyRanking)
        }
        Err(e) => {
            log::warn!("{e}; using fallback feature rounds");
            RoundPlan::fallback(
                schema,
                FallbackReason::OracleFailed {
                    message: e.to_string(),
                },
            )
        }
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Turn raw importance values into rounds of in-category rank.
///
/// Values are summed per (category, group, output) and rounded to four
/// decimals, then summed across outputs. Within a category groups are sorted
/// by descending importance, ties broken by code. Round `r` lists the
/// rank-`r` group of every category that has one, in category order.
pub fn rounds_from_importance(scores: &[ImportanceScore]) -> Vec<Vec<String>> {
    let mut per_output: BTreeMap<(&str, &str, usize), f64> = BTreeMap::new();
    for s in scores.iter().filter(|s| !s.value.is_nan()) {
        *per_output
            .entry((s.category.as_str(), s.feature_group.as_str(), s.output))
            .or_insert(0.0) += s.value;
    }

    let mut totals: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();
    for ((category, group, _), value) in per_output {
        *totals
            .entry(category)
            .or_default()
            .entry(group)
            .or_insert(0.0) += round4(value);
    }

    let ranked: Vec<Vec<&str>> = totals
        .into_values()
        .map(|groups| {
            let mut groups: Vec<(&str, f64)> = groups.into_iter().collect();
            // stable: equal importance keeps code order
            groups.sort_by(|a, b| b.1.total_cmp(&a.1));
            groups.into_iter().map(|(code, _)| code).collect()
        })
        .collect();

    let depth = ranked.iter().map(Vec::len).max().unwrap_or(0);
    (0..depth)
        .map(|rank| {
            ranked
                .iter()
                .filter_map(|category| category.get(rank).map(|code| code.to_string()))
                .collect()
        })
        .collect()
}

const STANDARD_FALLBACK: &[&[&str]] = &[
    &["1.3", "2.1.1", "3.4", "4.3"],
    &["2.1.2", "2.2", "3.1", "4.1"],
    &["2.1.3", "3.2", "4.2"],
    &["3.3", "1.1", "1.2", "1.4", "1.5"],
    &["1.3", "2.1.1"],
];

/// Fixed schedule for the standard questionnaire
pub fn standard_fallback() -> Vec<Vec<String>> {
    STANDARD_FALLBACK
        .iter()
        .map(|round| round.iter().map(|code| code.to_string()).collect())
        .collect()
}

/// Round `r` takes the `r`-th declared group of every category
pub fn positional_fallback(schema: &FeatureSchema) -> Vec<Vec<String>> {
    let mut by_category: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for group in schema.groups() {
        by_category
            .entry(group.category())
            .or_default()
            .push(group.code());
    }
    let depth = by_category.values().map(Vec::len).max().unwrap_or(0);
    (0..depth)
        .map(|rank| {
            by_category
                .values()
                .filter_map(|codes| codes.get(rank).map(|c| c.to_string()))
                .collect()
        })
        .collect()
}

pub fn fallback_rounds(schema: &FeatureSchema) -> Vec<Vec<String>> {
    if schema.is_standard() {
        standard_fallback()
    } else {
        positional_fallback(schema)
    }
}
