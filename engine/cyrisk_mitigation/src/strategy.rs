//! Mitigation report types, serialized in the camelCase wire shape.

use serde::{Deserialize, Serialize};

use crate::ranking::OrderingSource;

/// One proposed level change for one feature group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub feature_group: String,
    pub feature_name: String,
    pub current_option: String,
    pub recommended_option: String,
    /// Level index before the round
    pub current_index: usize,
    /// Recommended level index
    pub option_index: usize,
    pub description: String,
    /// Risk drop of this change alone, applied to the pre-round vector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_reduction: Option<f64>,
}

impl Recommendation {
    pub fn is_change(&self) -> bool {
        self.current_index != self.option_index
    }
}

/// A planned feature group that had no columns in the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFeature {
    pub feature_group: String,
    pub reason: String,
}

impl SkippedFeature {
    pub fn missing_columns(code: &str) -> Self {
        Self {
            feature_group: code.to_string(),
            reason: format!("no columns match feature '{code}'"),
        }
    }
}

/// A batch of recommendations applied together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MitigationRound {
    pub round_number: usize,
    /// Feature groups the plan scheduled for this round
    pub features: Vec<String>,
    pub current_risk: f64,
    pub projected_risk: f64,
    pub risk_reduction: f64,
    pub reduction_percentage: f64,
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_features: Vec<SkippedFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCheckpoint {
    pub label: String,
    pub risk: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImplementationPriority {
    High,
    Medium,
    Low,
}

impl ImplementationPriority {
    /// `high` above 30 %, `medium` above 15 %, otherwise `low`
    pub fn from_reduction_percentage(percentage: f64) -> Self {
        if percentage > 30.0 {
            ImplementationPriority::High
        } else if percentage > 15.0 {
            ImplementationPriority::Medium
        } else {
            ImplementationPriority::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImplementationPriority::High => "high",
            ImplementationPriority::Medium => "medium",
            ImplementationPriority::Low => "low",
        }
    }
}

/// Full mitigation report for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MitigationStrategy {
    pub initial_risk: f64,
    pub final_risk: f64,
    pub total_reduction: f64,
    pub total_reduction_percentage: f64,
    pub rounds: Vec<MitigationRound>,
    pub implementation_priority: ImplementationPriority,
    pub ordering_source: OrderingSource,
    pub risk_trace: Vec<RiskCheckpoint>,
}

impl MitigationStrategy {
    pub fn recommendation_count(&self) -> usize {
        self.rounds.iter().map(|r| r.recommendations.len()).sum()
    }

    /// True when the rounds came from the fallback schedule
    pub fn is_degraded(&self) -> bool {
        matches!(self.ordering_source, OrderingSource::Fallback { .. })
    }
}

/// Risk change of one isolated recommendation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskDelta {
    pub risk_reduction: f64,
    pub risk_reduction_percentage: f64,
}

impl RiskDelta {
    pub fn between(before: f64, after: f64) -> Self {
        let risk_reduction = before - after;
        Self {
            risk_reduction,
            risk_reduction_percentage: reduction_percentage(before, risk_reduction),
        }
    }

    pub fn unchanged() -> Self {
        Self {
            risk_reduction: 0.0,
            risk_reduction_percentage: 0.0,
        }
    }
}

/// `reduction / before * 100`, or 0 when there was no risk to reduce
pub fn reduction_percentage(before: f64, reduction: f64) -> f64 {
    if before > 0.0 {
        reduction / before * 100.0
    } else {
        0.0
    }
}
